//! Persistence gateway over the agency document store.
//!
//! Every collection is a schemaless SurrealDB table. Each public method is a
//! single query or a single document mutation, except where noted: there is
//! no batching, caching or retry, and multi-step operations are not
//! transactional.

use crate::config::StorageConfig;
use crate::models::{
    CaseStudy, Campaign, ChatLogEntry, Client, ContextOsRecord, KanbanTask, Notification, Offer,
    OfferStatus, ServiceData, SupportTicket, TaskStatus, TicketReply, TicketStatus, now_rfc3339,
};
use crate::services::fuzzy::best_match;
use color_eyre::{Result, eyre::eyre};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::sql::Thing;

pub const CLIENTS: &str = "agency_clients";
pub const OFFERS: &str = "agency_offers";
pub const CAMPAIGNS: &str = "agency_campaigns";
pub const KANBAN: &str = "agency_kanban";
pub const CASE_STUDIES: &str = "agency_case_studies";
pub const SERVICES: &str = "agency_services";
pub const NOTIFICATIONS: &str = "agency_notifications";
pub const TICKETS: &str = "agency_tickets";
pub const CONTEXT_OS: &str = "context_os";
pub const CHAT_LOGS: &str = "ai_chat_logs";

const COLLECTIONS: [&str; 10] = [
    CLIENTS,
    OFFERS,
    CAMPAIGNS,
    KANBAN,
    CASE_STUDIES,
    SERVICES,
    NOTIFICATIONS,
    TICKETS,
    CONTEXT_OS,
    CHAT_LOGS,
];

/// Key of the Context OS singleton document
const CONTEXT_OS_KEY: &str = "main";

/// Recipient id used for back-office notifications
pub const ADMIN_RECIPIENT: &str = "admin";

/// Only the record id, for create/delete results
#[derive(Debug, Deserialize)]
struct RecordKey {
    id: Thing,
}

/// Manages the document store connection
#[derive(Clone)]
pub struct StorageManager {
    db: Surreal<Db>,
}

impl StorageManager {
    /// Opens (or creates) the on-disk store described by the config
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let data_dir = config.resolve_data_dir()?;
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join("ecm.db");

        let db = Surreal::new::<RocksDb>(db_path).await?;
        Self::with_db(db, &config.namespace, &config.database).await
    }

    /// Fresh in-memory store, used by tests
    pub async fn in_memory() -> Result<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        Self::with_db(db, "ecm", "test").await
    }

    async fn with_db(db: Surreal<Db>, namespace: &str, database: &str) -> Result<Self> {
        db.use_ns(namespace).use_db(database).await?;
        let manager = Self { db };
        manager.init_db().await?;
        Ok(manager)
    }

    async fn init_db(&self) -> Result<()> {
        let statements = COLLECTIONS
            .iter()
            .map(|table| format!("DEFINE TABLE IF NOT EXISTS {table} SCHEMALESS;"))
            .collect::<Vec<_>>()
            .join("\n");
        self.db.query(statements).await?.check()?;
        Ok(())
    }

    /// Accepts both `abc` and `agency_clients:abc`
    fn normalize_id<'a>(table: &str, id: &'a str) -> &'a str {
        id.strip_prefix(table)
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(id)
            .trim()
    }

    // ── Generic document helpers ────────────────────────────────────────────

    async fn create<T>(&self, table: &'static str, record: T) -> Result<String>
    where
        T: Serialize + 'static,
    {
        let created: Option<RecordKey> = self.db.create(table).content(record).await?;
        let key = created
            .map(|record| record.id.id.to_raw())
            .ok_or_else(|| eyre!("Failed to create record in {}", table))?;
        tracing::debug!(table, id = %key, "created document");
        Ok(key)
    }

    async fn get<T>(&self, table: &'static str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let id = Self::normalize_id(table, id);
        let record: Option<T> = self.db.select((table, id)).await?;
        Ok(record)
    }

    async fn require<T>(&self, table: &'static str, id: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get(table, id)
            .await?
            .ok_or_else(|| eyre!("No document '{}' in {}", id, table))
    }

    /// Merges `patch` into an existing document. Returns `None` when the
    /// document does not exist; nothing is created in that case.
    async fn merge<T>(&self, table: &'static str, id: &str, patch: serde_json::Value) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let id = Self::normalize_id(table, id);
        let updated: Option<T> = self.db.update((table, id)).merge(patch).await?;
        tracing::debug!(table, id, found = updated.is_some(), "merged document");
        Ok(updated)
    }

    async fn delete(&self, table: &'static str, id: &str) -> Result<bool> {
        let id = Self::normalize_id(table, id);
        let deleted: Option<RecordKey> = self.db.delete((table, id)).await?;
        Ok(deleted.is_some())
    }

    async fn list<T>(&self, table: &'static str, order_by: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut response = self
            .db
            .query(format!("SELECT * FROM {table} ORDER BY {order_by}"))
            .await?;
        let records: Vec<T> = response.take(0)?;
        Ok(records)
    }

    async fn list_where<T>(
        &self,
        table: &'static str,
        field: &'static str,
        value: String,
        order_by: &str,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut response = self
            .db
            .query(format!(
                "SELECT * FROM {table} WHERE {field} = $value ORDER BY {order_by}"
            ))
            .bind(("value", value))
            .await?;
        let records: Vec<T> = response.take(0)?;
        Ok(records)
    }

    // ── Clients ─────────────────────────────────────────────────────────────

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        self.list(CLIENTS, "created_at DESC").await
    }

    pub async fn get_client(&self, id: &str) -> Result<Option<Client>> {
        self.get(CLIENTS, id).await
    }

    pub async fn add_client(&self, client: Client) -> Result<String> {
        self.create(CLIENTS, client).await
    }

    pub async fn update_client(&self, id: &str, patch: serde_json::Value) -> Result<Option<Client>> {
        self.merge(CLIENTS, id, patch).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<bool> {
        self.delete(CLIENTS, id).await
    }

    /// Resolves a client reference by company or contact name (linear scan)
    pub async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>> {
        let clients = self.list_clients().await?;
        let by_company = best_match(name, &clients, |client| client.display_name());
        let by_contact = best_match(name, &clients, |client| client.name.as_str());
        let best = match (by_company, by_contact) {
            (Some(first), Some(second)) => Some(if second.1 > first.1 { second } else { first }),
            (first, second) => first.or(second),
        };
        Ok(best.map(|(client, _)| client.clone()))
    }

    // ── Offers ──────────────────────────────────────────────────────────────

    pub async fn list_offers(&self) -> Result<Vec<Offer>> {
        self.list(OFFERS, "created_at DESC").await
    }

    pub async fn offers_for_client(&self, client_id: &str) -> Result<Vec<Offer>> {
        let client_id = Self::normalize_id(CLIENTS, client_id).to_string();
        self.list_where(OFFERS, "client_id", client_id, "created_at DESC")
            .await
    }

    pub async fn get_offer(&self, id: &str) -> Result<Option<Offer>> {
        self.get(OFFERS, id).await
    }

    pub async fn add_offer(&self, mut offer: Offer) -> Result<String> {
        offer.recompute_total();
        self.create(OFFERS, offer).await
    }

    pub async fn update_offer(&self, id: &str, patch: serde_json::Value) -> Result<Option<Offer>> {
        self.merge(OFFERS, id, patch).await
    }

    /// Moves an offer along its status machine. Sending an offer also
    /// notifies the client; that second write is not rolled back if it fails.
    pub async fn set_offer_status(&self, id: &str, next: OfferStatus) -> Result<Offer> {
        let offer: Offer = self.require(OFFERS, id).await?;
        let status = offer.status.transition_to(next)?;
        let updated: Offer = self
            .merge(OFFERS, id, serde_json::json!({ "status": status }))
            .await?
            .ok_or_else(|| eyre!("Offer '{}' disappeared during update", id))?;
        tracing::info!(offer = %id, status = %status, "offer status changed");

        if status == OfferStatus::Sent {
            self.add_notification(Notification::new(
                &updated.client_id,
                "Nowa oferta",
                format!("Otrzymałeś ofertę: {}", updated.title),
            ))
            .await?;
        }
        Ok(updated)
    }

    pub async fn delete_offer(&self, id: &str) -> Result<bool> {
        self.delete(OFFERS, id).await
    }

    // ── Campaigns ───────────────────────────────────────────────────────────

    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        self.list(CAMPAIGNS, "start_date DESC").await
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        self.get(CAMPAIGNS, id).await
    }

    pub async fn add_campaign(&self, campaign: Campaign) -> Result<String> {
        self.create(CAMPAIGNS, campaign).await
    }

    pub async fn update_campaign(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Option<Campaign>> {
        self.merge(CAMPAIGNS, id, patch).await
    }

    pub async fn delete_campaign(&self, id: &str) -> Result<bool> {
        self.delete(CAMPAIGNS, id).await
    }

    // ── Kanban ──────────────────────────────────────────────────────────────

    pub async fn list_tasks(&self) -> Result<Vec<KanbanTask>> {
        self.list(KANBAN, "created_at ASC").await
    }

    pub async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<KanbanTask>> {
        self.list_where(KANBAN, "status", status.to_string(), "created_at ASC")
            .await
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<KanbanTask>> {
        self.get(KANBAN, id).await
    }

    pub async fn add_task(&self, task: KanbanTask) -> Result<String> {
        self.create(KANBAN, task).await
    }

    pub async fn update_task(&self, id: &str, patch: serde_json::Value) -> Result<Option<KanbanTask>> {
        self.merge(KANBAN, id, patch).await
    }

    /// Board drag and drop: any column is allowed
    pub async fn move_task(&self, id: &str, status: TaskStatus) -> Result<KanbanTask> {
        self.merge(KANBAN, id, serde_json::json!({ "status": status }))
            .await?
            .ok_or_else(|| eyre!("No task '{}' on the board", id))
    }

    pub async fn delete_task(&self, id: &str) -> Result<bool> {
        self.delete(KANBAN, id).await
    }

    // ── Case studies ────────────────────────────────────────────────────────

    pub async fn list_case_studies(&self) -> Result<Vec<CaseStudy>> {
        self.list(CASE_STUDIES, "created_at DESC").await
    }

    pub async fn get_case_study(&self, id: &str) -> Result<Option<CaseStudy>> {
        self.get(CASE_STUDIES, id).await
    }

    pub async fn get_case_study_by_slug(&self, slug: &str) -> Result<Option<CaseStudy>> {
        let found: Vec<CaseStudy> = self
            .list_where(CASE_STUDIES, "slug", slug.to_string(), "created_at DESC")
            .await?;
        Ok(found.into_iter().next())
    }

    pub async fn add_case_study(&self, case_study: CaseStudy) -> Result<String> {
        self.create(CASE_STUDIES, case_study).await
    }

    pub async fn update_case_study(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Option<CaseStudy>> {
        self.merge(CASE_STUDIES, id, patch).await
    }

    pub async fn delete_case_study(&self, id: &str) -> Result<bool> {
        self.delete(CASE_STUDIES, id).await
    }

    // ── Services ────────────────────────────────────────────────────────────

    pub async fn list_services(&self) -> Result<Vec<ServiceData>> {
        self.list(SERVICES, "title ASC").await
    }

    pub async fn get_service_by_slug(&self, slug: &str) -> Result<Option<ServiceData>> {
        let found: Vec<ServiceData> = self
            .list_where(SERVICES, "slug", slug.to_string(), "title ASC")
            .await?;
        Ok(found.into_iter().next())
    }

    pub async fn add_service(&self, service: ServiceData) -> Result<String> {
        self.create(SERVICES, service).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<bool> {
        self.delete(SERVICES, id).await
    }

    // ── Notifications ───────────────────────────────────────────────────────

    pub async fn notifications_for(
        &self,
        recipient_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let notifications: Vec<Notification> = self
            .list_where(
                NOTIFICATIONS,
                "recipient_id",
                recipient_id.to_string(),
                "created_at DESC",
            )
            .await?;
        Ok(notifications
            .into_iter()
            .filter(|notification| !unread_only || !notification.read)
            .collect())
    }

    pub async fn add_notification(&self, notification: Notification) -> Result<String> {
        self.create(NOTIFICATIONS, notification).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<bool> {
        let updated: Option<Notification> = self
            .merge(NOTIFICATIONS, id, serde_json::json!({ "read": true }))
            .await?;
        Ok(updated.is_some())
    }

    // ── Support tickets ─────────────────────────────────────────────────────

    pub async fn list_tickets(&self) -> Result<Vec<SupportTicket>> {
        self.list(TICKETS, "created_at DESC").await
    }

    pub async fn tickets_for_client(&self, client_id: &str) -> Result<Vec<SupportTicket>> {
        let client_id = Self::normalize_id(CLIENTS, client_id).to_string();
        self.list_where(TICKETS, "client_id", client_id, "created_at DESC")
            .await
    }

    pub async fn get_ticket(&self, id: &str) -> Result<Option<SupportTicket>> {
        self.get(TICKETS, id).await
    }

    pub async fn add_ticket(&self, ticket: SupportTicket) -> Result<String> {
        let id = self.create(TICKETS, ticket.clone()).await?;
        self.add_notification(Notification::new(
            ADMIN_RECIPIENT,
            "Nowe zgłoszenie",
            ticket.subject,
        ))
        .await?;
        Ok(id)
    }

    /// Appends a reply. An agency reply picks up an open ticket and notifies
    /// the client; a client reply notifies the back office.
    pub async fn reply_to_ticket(
        &self,
        id: &str,
        author: &str,
        text: &str,
        from_agency: bool,
    ) -> Result<SupportTicket> {
        let ticket: SupportTicket = self.require(TICKETS, id).await?;
        let status = if from_agency {
            ticket.status_after_agency_reply()
        } else {
            ticket.status
        };
        let mut replies = ticket.replies.clone();
        replies.push(TicketReply {
            author: author.to_string(),
            text: text.to_string(),
            created_at: now_rfc3339(),
        });

        let updated: SupportTicket = self
            .merge(
                TICKETS,
                id,
                serde_json::json!({ "replies": replies, "status": status }),
            )
            .await?
            .ok_or_else(|| eyre!("Ticket '{}' disappeared during update", id))?;

        let recipient = if from_agency {
            updated.client_id.as_str()
        } else {
            ADMIN_RECIPIENT
        };
        self.add_notification(Notification::new(
            recipient,
            format!("Odpowiedź: {}", updated.subject),
            text,
        ))
        .await?;
        Ok(updated)
    }

    /// Moves a ticket forward: open, in progress, closed
    pub async fn set_ticket_status(&self, id: &str, next: TicketStatus) -> Result<SupportTicket> {
        let ticket: SupportTicket = self.require(TICKETS, id).await?;
        let status = ticket.status.transition_to(next)?;
        let updated = self
            .merge(TICKETS, id, serde_json::json!({ "status": status }))
            .await?
            .ok_or_else(|| eyre!("Ticket '{}' disappeared during update", id))?;
        tracing::info!(ticket = %id, status = %status, "ticket status changed");
        Ok(updated)
    }

    // ── Context OS ──────────────────────────────────────────────────────────

    /// Loads the singleton; a missing document reads as an empty record
    pub async fn load_context_os(&self) -> Result<ContextOsRecord> {
        let record: Option<ContextOsRecord> = self.db.select((CONTEXT_OS, CONTEXT_OS_KEY)).await?;
        Ok(record.unwrap_or_default())
    }

    /// Replaces the singleton. Last write wins.
    pub async fn save_context_os(&self, mut record: ContextOsRecord) -> Result<()> {
        record.updated_at = now_rfc3339();
        self.db
            .query(format!("UPSERT {CONTEXT_OS}:{CONTEXT_OS_KEY} CONTENT $data"))
            .bind(("data", record))
            .await?
            .check()?;
        Ok(())
    }

    /// Read-modify-write of the meeting notes; concurrent appends may lose one
    pub async fn append_meeting_notes(&self, notes: &str) -> Result<ContextOsRecord> {
        let mut record = self.load_context_os().await?;
        record.append_meeting_notes(notes);
        self.save_context_os(record.clone()).await?;
        Ok(record)
    }

    // ── Chat logs ───────────────────────────────────────────────────────────

    pub async fn log_chat_turn(&self, entry: ChatLogEntry) -> Result<String> {
        self.create(CHAT_LOGS, entry).await
    }

    pub async fn load_chat_session(&self, session_id: &str) -> Result<Vec<ChatLogEntry>> {
        self.list_where(CHAT_LOGS, "session_id", session_id.to_string(), "timestamp ASC")
            .await
    }
}
