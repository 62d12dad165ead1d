use crate::models::{ChatLogEntry, now_rfc3339};
use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Bot,
}

impl TurnRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Bot => "bot",
        }
    }

    fn from_log(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            TurnRole::User
        } else {
            TurnRole::Bot
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    /// Bot turn that carried out an action instead of just answering
    pub is_action: bool,
    pub timestamp: String,
}

/// Ordered turns of one admin session, held in memory
#[derive(Debug, Clone)]
pub struct Conversation {
    session_id: String,
    turns: Vec<ConversationTurn>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::with_session_id(format!("session-{}", Local::now().timestamp_millis()))
    }

    #[must_use]
    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
        }
    }

    /// Rebuilds a session from its mirrored chat log
    #[must_use]
    pub fn from_log(session_id: impl Into<String>, entries: &[ChatLogEntry]) -> Self {
        let mut conversation = Self::with_session_id(session_id);
        conversation.turns = entries
            .iter()
            .map(|entry| ConversationTurn {
                role: TurnRole::from_log(&entry.role),
                text: entry.text.clone(),
                is_action: entry.is_action,
                timestamp: entry.timestamp.clone(),
            })
            .collect();
        conversation
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Appends a user turn and returns a copy of it
    pub fn push_user(&mut self, text: impl Into<String>) -> ConversationTurn {
        self.push(TurnRole::User, text.into(), false)
    }

    pub fn push_bot(&mut self, text: impl Into<String>, is_action: bool) -> ConversationTurn {
        self.push(TurnRole::Bot, text.into(), is_action)
    }

    fn push(&mut self, role: TurnRole, text: String, is_action: bool) -> ConversationTurn {
        let turn = ConversationTurn {
            role,
            text,
            is_action,
            timestamp: now_rfc3339(),
        };
        self.turns.push(turn.clone());
        turn
    }

    /// Last `count` turns, oldest first
    #[must_use]
    pub fn recent(&self, count: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(count);
        self.turns.get(start..).unwrap_or_default()
    }

    /// Chat log record mirroring one turn of this session
    #[must_use]
    pub fn log_entry(&self, turn: &ConversationTurn) -> ChatLogEntry {
        ChatLogEntry {
            session_id: self.session_id.clone(),
            role: turn.role.as_str().to_string(),
            text: turn.text.clone(),
            is_action: turn.is_action,
            timestamp: turn.timestamp.clone(),
        }
    }
}
