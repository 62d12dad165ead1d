use crate::models::{Client, Notification, Offer, OfferStatus, SupportTicket, TicketStatus};
use crate::storage::StorageManager;
use color_eyre::{Result, eyre::eyre};

/// Everything a client sees in their portal
#[derive(Debug, Clone)]
pub struct ClientDashboard {
    pub client: Client,
    pub offers: Vec<Offer>,
    pub tickets: Vec<SupportTicket>,
    pub unread_notifications: Vec<Notification>,
}

impl ClientDashboard {
    pub async fn load(storage: &StorageManager, client_id: &str) -> Result<Self> {
        let client = storage
            .get_client(client_id)
            .await?
            .ok_or_else(|| eyre!("No client '{}'", client_id))?;
        let offers = storage.offers_for_client(&client.id).await?;
        let tickets = storage.tickets_for_client(&client.id).await?;
        let unread_notifications = storage.notifications_for(&client.id, true).await?;
        Ok(Self {
            client,
            offers,
            tickets,
            unread_notifications,
        })
    }

    /// Offers waiting on the client's decision
    #[must_use]
    pub fn pending_offers(&self) -> usize {
        self.offers
            .iter()
            .filter(|offer| offer.status == OfferStatus::Sent)
            .count()
    }

    #[must_use]
    pub fn open_tickets(&self) -> usize {
        self.tickets
            .iter()
            .filter(|ticket| ticket.status != TicketStatus::Closed)
            .count()
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("{} ({})", self.client.display_name(), self.client.status),
            String::new(),
            format!(
                "Oferty ({}, oczekujące: {}):",
                self.offers.len(),
                self.pending_offers()
            ),
        ];
        lines.extend(self.offers.iter().map(|offer| {
            format!("  [{}] {} {:.2} PLN ({})", offer.id, offer.title, offer.total, offer.status)
        }));

        lines.push(String::new());
        lines.push(format!(
            "Zgłoszenia ({}, otwarte: {}):",
            self.tickets.len(),
            self.open_tickets()
        ));
        lines.extend(self.tickets.iter().map(|ticket| {
            format!(
                "  [{}] {} ({}, odpowiedzi: {})",
                ticket.id,
                ticket.subject,
                ticket.status,
                ticket.replies.len()
            )
        }));

        lines.push(String::new());
        lines.push(format!("Nieprzeczytane powiadomienia: {}", self.unread_notifications.len()));
        lines.extend(
            self.unread_notifications
                .iter()
                .map(|notification| format!("  {}: {}", notification.title, notification.message)),
        );
        lines.join("\n")
    }
}
