//! Agency entity records as they are stored in the document store.
//!
//! Records are flat and relations are plain string ids (`Offer::client_id`
//! and friends) resolved at read time. The `id` field is filled from the
//! store's record id on read and never written back.

use chrono::Local;
use color_eyre::{Result, eyre::eyre};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use surrealdb::sql::Thing;

/// Reads a SurrealDB record id into its raw key (`agency_clients:abc` -> `abc`)
pub(crate) fn deserialize_record_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let thing = Option::<Thing>::deserialize(deserializer)?;
    Ok(thing.map(|thing| thing.id.to_raw()).unwrap_or_default())
}

pub(crate) fn now_rfc3339() -> String {
    Local::now().to_rfc3339()
}

/// Implements `Display` and `FromStr` over the snake_case wire names of a status enum
macro_rules! wire_names {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
                let normalized = value.trim().to_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(format!(
                        "unknown {} '{}' (expected one of: {})",
                        stringify!($name),
                        value,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

// ── Clients ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Lead,
    Active,
    Inactive,
}

wire_names!(ClientStatus { Lead => "lead", Active => "active", Inactive => "inactive" });

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub status: ClientStatus,
    pub notes: String,
    pub created_at: String,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: now_rfc3339(),
            ..Self::default()
        }
    }

    /// Name shown in lists: company when known, otherwise the contact name
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.company.trim().is_empty() {
            &self.name
        } else {
            &self.company
        }
    }
}

// ── Offers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

wire_names!(OfferStatus {
    Draft => "draft",
    Sent => "sent",
    Accepted => "accepted",
    Rejected => "rejected",
});

impl OfferStatus {
    #[must_use]
    pub fn can_transition_to(self, next: OfferStatus) -> bool {
        matches!(
            (self, next),
            (OfferStatus::Draft, OfferStatus::Sent)
                | (OfferStatus::Sent, OfferStatus::Accepted)
                | (OfferStatus::Sent, OfferStatus::Rejected)
                | (OfferStatus::Rejected, OfferStatus::Draft)
        )
    }

    pub fn transition_to(self, next: OfferStatus) -> Result<OfferStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(eyre!("Offer cannot move from '{}' to '{}'", self, next))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl OfferItem {
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Offer {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub description: String,
    pub items: Vec<OfferItem>,
    pub total: f64,
    pub status: OfferStatus,
    pub valid_until: String,
    pub created_at: String,
}

impl Offer {
    pub fn new(client_id: impl Into<String>, title: impl Into<String>, items: Vec<OfferItem>) -> Self {
        let mut offer = Self {
            client_id: client_id.into(),
            title: title.into(),
            items,
            created_at: now_rfc3339(),
            ..Self::default()
        };
        offer.recompute_total();
        offer
    }

    pub fn recompute_total(&mut self) {
        self.total = self.items.iter().map(OfferItem::line_total).sum();
    }
}

// ── Campaigns ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Planned,
    #[default]
    Active,
    Paused,
    Completed,
}

wire_names!(CampaignStatus {
    Planned => "planned",
    Active => "active",
    Paused => "paused",
    Completed => "completed",
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub platform: String,
    pub status: CampaignStatus,
    pub budget: f64,
    pub spent: f64,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
    pub notes: String,
}

impl Campaign {
    #[must_use]
    pub fn remaining_budget(&self) -> f64 {
        self.budget - self.spent
    }
}

// ── Kanban ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

wire_names!(TaskStatus {
    Todo => "todo",
    InProgress => "in_progress",
    Review => "review",
    Done => "done",
});

impl TaskStatus {
    pub const COLUMNS: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    /// Next column to the right; `Done` stays `Done`
    #[must_use]
    pub fn advance(self) -> TaskStatus {
        match self {
            TaskStatus::Todo => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Review,
            TaskStatus::Review | TaskStatus::Done => TaskStatus::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

wire_names!(Priority { Low => "low", Medium => "medium", High => "high" });

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KanbanTask {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub created_at: String,
}

impl KanbanTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            created_at: now_rfc3339(),
            ..Self::default()
        }
    }
}

// ── Case studies & services ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseStudy {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub slug: String,
    pub title: String,
    pub client: String,
    pub category: String,
    pub challenge: String,
    pub solution: String,
    pub results: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testimonial: Option<Testimonial>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceData {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_from: Option<f64>,
}

// ── Notifications & support ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Client id, or `admin` for back-office notifications
    pub recipient_id: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

impl Notification {
    pub fn new(
        recipient_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            title: title.into(),
            message: message.into(),
            created_at: now_rfc3339(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

wire_names!(TicketStatus {
    Open => "open",
    InProgress => "in_progress",
    Closed => "closed",
});

impl TicketStatus {
    /// Tickets only move forward; an open ticket may be closed unanswered
    #[must_use]
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Open, TicketStatus::InProgress)
                | (TicketStatus::Open, TicketStatus::Closed)
                | (TicketStatus::InProgress, TicketStatus::Closed)
        )
    }

    pub fn transition_to(self, next: TicketStatus) -> Result<TicketStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(eyre!("Ticket cannot move from '{}' to '{}'", self, next))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketReply {
    pub author: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportTicket {
    #[serde(deserialize_with = "deserialize_record_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub client_id: String,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub replies: Vec<TicketReply>,
    pub created_at: String,
}

impl SupportTicket {
    /// Status after an agency reply: an open ticket is picked up, others keep theirs
    #[must_use]
    pub fn status_after_agency_reply(&self) -> TicketStatus {
        match self.status {
            TicketStatus::Open => TicketStatus::InProgress,
            other => other,
        }
    }
}

// ── Context OS & chat logs ──────────────────────────────────────────────────

/// Company knowledge injected into every assistant prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOsRecord {
    pub tone_of_voice: String,
    pub sops: String,
    pub business_goals: String,
    pub meeting_notes: String,
    pub custom_instructions: String,
    pub updated_at: String,
}

/// Editable Context OS fields, addressed by name from the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    ToneOfVoice,
    Sops,
    BusinessGoals,
    MeetingNotes,
    CustomInstructions,
}

wire_names!(ContextField {
    ToneOfVoice => "tone_of_voice",
    Sops => "sops",
    BusinessGoals => "business_goals",
    MeetingNotes => "meeting_notes",
    CustomInstructions => "custom_instructions",
});

impl ContextOsRecord {
    pub fn set(&mut self, field: ContextField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ContextField::ToneOfVoice => self.tone_of_voice = value,
            ContextField::Sops => self.sops = value,
            ContextField::BusinessGoals => self.business_goals = value,
            ContextField::MeetingNotes => self.meeting_notes = value,
            ContextField::CustomInstructions => self.custom_instructions = value,
        }
    }

    /// Appends a block of notes, separated from earlier notes by a blank line
    pub fn append_meeting_notes(&mut self, notes: &str) {
        let notes = notes.trim();
        if notes.is_empty() {
            return;
        }
        if self.meeting_notes.trim().is_empty() {
            self.meeting_notes = notes.to_string();
        } else {
            self.meeting_notes = format!("{}\n\n{}", self.meeting_notes.trim_end(), notes);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.tone_of_voice,
            &self.sops,
            &self.business_goals,
            &self.meeting_notes,
            &self.custom_instructions,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatLogEntry {
    pub session_id: String,
    pub role: String,
    pub text: String,
    pub is_action: bool,
    pub timestamp: String,
}
