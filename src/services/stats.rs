use crate::models::{
    Campaign, CampaignStatus, Client, ClientStatus, KanbanTask, Offer, OfferStatus, TaskStatus,
};
use crate::storage::StorageManager;
use color_eyre::Result;

/// Snapshot of the agency pipeline across clients, offers, campaigns and the board
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgencyStats {
    pub clients_total: usize,
    pub clients_active: usize,
    pub clients_leads: usize,
    pub offers_total: usize,
    pub offers_by_status: [(OfferStatus, usize); 4],
    /// Sum of accepted offer totals
    pub accepted_value: f64,
    /// Sum of offers still waiting on the client
    pub pipeline_value: f64,
    pub campaigns_total: usize,
    pub campaigns_active: usize,
    pub campaign_budget: f64,
    pub campaign_spent: f64,
    pub tasks_by_status: [(TaskStatus, usize); 4],
}

impl AgencyStats {
    #[must_use]
    pub fn compute(
        clients: &[Client],
        offers: &[Offer],
        campaigns: &[Campaign],
        tasks: &[KanbanTask],
    ) -> Self {
        let count_offers = |status: OfferStatus| {
            offers.iter().filter(|offer| offer.status == status).count()
        };
        let sum_offers = |status: OfferStatus| {
            offers
                .iter()
                .filter(|offer| offer.status == status)
                .map(|offer| offer.total)
                .sum::<f64>()
        };
        let count_tasks =
            |status: TaskStatus| tasks.iter().filter(|task| task.status == status).count();

        Self {
            clients_total: clients.len(),
            clients_active: clients
                .iter()
                .filter(|client| client.status == ClientStatus::Active)
                .count(),
            clients_leads: clients
                .iter()
                .filter(|client| client.status == ClientStatus::Lead)
                .count(),
            offers_total: offers.len(),
            offers_by_status: [
                OfferStatus::Draft,
                OfferStatus::Sent,
                OfferStatus::Accepted,
                OfferStatus::Rejected,
            ]
            .map(|status| (status, count_offers(status))),
            accepted_value: sum_offers(OfferStatus::Accepted),
            pipeline_value: sum_offers(OfferStatus::Sent),
            campaigns_total: campaigns.len(),
            campaigns_active: campaigns
                .iter()
                .filter(|campaign| campaign.status == CampaignStatus::Active)
                .count(),
            campaign_budget: campaigns.iter().map(|campaign| campaign.budget).sum(),
            campaign_spent: campaigns.iter().map(|campaign| campaign.spent).sum(),
            tasks_by_status: TaskStatus::COLUMNS.map(|status| (status, count_tasks(status))),
        }
    }

    /// Reads the four collections one after another and aggregates them
    pub async fn collect(storage: &StorageManager) -> Result<Self> {
        let clients = storage.list_clients().await?;
        let offers = storage.list_offers().await?;
        let campaigns = storage.list_campaigns().await?;
        let tasks = storage.list_tasks().await?;
        Ok(Self::compute(&clients, &offers, &campaigns, &tasks))
    }

    #[must_use]
    pub fn tasks_open(&self) -> usize {
        self.tasks_by_status
            .iter()
            .filter(|(status, _)| *status != TaskStatus::Done)
            .map(|(_, count)| count)
            .sum()
    }

    /// Plain-text report used by the assistant and the `stats` command
    #[must_use]
    pub fn render(&self) -> String {
        let offers = self
            .offers_by_status
            .iter()
            .map(|(status, count)| format!("{status}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        let tasks = self
            .tasks_by_status
            .iter()
            .map(|(status, count)| format!("{status}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");

        [
            "📊 Podsumowanie agencji".to_string(),
            format!(
                "Klienci: {} (aktywni: {}, leady: {})",
                self.clients_total, self.clients_active, self.clients_leads
            ),
            format!("Oferty: {} ({offers})", self.offers_total),
            format!(
                "Wartość zaakceptowanych ofert: {:.2} PLN, w negocjacji: {:.2} PLN",
                self.accepted_value, self.pipeline_value
            ),
            format!(
                "Kampanie: {} (aktywne: {}), budżet {:.2} PLN, wydano {:.2} PLN",
                self.campaigns_total, self.campaigns_active, self.campaign_budget, self.campaign_spent
            ),
            format!("Zadania: {} otwartych ({tasks})", self.tasks_open()),
        ]
        .join("\n")
    }
}
