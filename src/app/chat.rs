pub mod agent;
pub mod conversation;
pub mod prompt;

use crate::agents::{AudioClip, CompletionClient};
use crate::app::chat::agent::{dispatch, extract_action};
use crate::app::chat::conversation::{Conversation, TurnRole};
use crate::app::chat::prompt::build_prompt;
use crate::config::AssistantConfig;
use crate::services::dates;
use crate::storage::StorageManager;
use chrono::NaiveDate;
use color_eyre::Result;

/// Text stored as the user turn for a voice message
pub const VOICE_TURN_TEXT: &str = "🎤 [wiadomość głosowa]";
const VOICE_PROMPT: &str =
    "Odsłuchaj załączone nagranie i potraktuj je jako wiadomość od użytkownika.";

/// What the admin sees after one message
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    pub is_action: bool,
    /// Name of the dispatched action, if any
    pub action: Option<&'static str>,
}

/// The admin AI assistant: one conversation against one model and store
pub struct AdminAssistant<C: CompletionClient> {
    client: C,
    storage: StorageManager,
    conversation: Conversation,
    settings: AssistantConfig,
    today: fn() -> NaiveDate,
}

impl<C: CompletionClient> AdminAssistant<C> {
    pub fn new(client: C, storage: StorageManager, settings: AssistantConfig) -> Self {
        Self::resume(client, storage, settings, Conversation::new())
    }

    /// Continues an existing conversation, e.g. one rebuilt from the chat log
    pub fn resume(
        client: C,
        storage: StorageManager,
        settings: AssistantConfig,
        conversation: Conversation,
    ) -> Self {
        Self {
            client,
            storage,
            conversation,
            settings,
            today: dates::today,
        }
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn reset(&mut self) {
        self.conversation = Conversation::new();
    }

    pub async fn handle_message(&mut self, message: &str) -> Result<AssistantReply> {
        self.respond(message, message, None).await
    }

    /// Same flow as a typed message with the recording attached to the model call
    pub async fn handle_voice(&mut self, audio: &AudioClip) -> Result<AssistantReply> {
        self.respond(VOICE_TURN_TEXT, VOICE_PROMPT, Some(audio)).await
    }

    async fn respond(
        &mut self,
        turn_text: &str,
        prompt_message: &str,
        audio: Option<&AudioClip>,
    ) -> Result<AssistantReply> {
        let today = (self.today)();
        let history = self
            .conversation
            .recent(self.settings.history_turns)
            .to_vec();
        self.record_turn(TurnRole::User, turn_text, false).await;

        let context = self.storage.load_context_os().await?;
        let prompt = build_prompt(prompt_message, &history, &context, today);
        tracing::debug!(
            session = self.conversation.session_id(),
            prompt_chars = prompt.len(),
            history_turns = history.len(),
            "sending prompt"
        );

        let raw = match audio {
            Some(audio) => self.client.generate_with_audio(&prompt, audio).await?,
            None => self.client.generate(&prompt).await?,
        };

        let reply = match extract_action(&raw) {
            Some(extracted) => {
                let confirmation = dispatch(&self.storage, &extracted.intent, today).await?;
                let text = if extracted.remaining_text.is_empty() {
                    confirmation
                } else {
                    format!("{}\n\n{}", extracted.remaining_text, confirmation)
                };
                AssistantReply {
                    text,
                    is_action: true,
                    action: Some(extracted.intent.name()),
                }
            }
            None => AssistantReply {
                text: raw.trim().to_string(),
                is_action: false,
                action: None,
            },
        };

        self.record_turn(TurnRole::Bot, &reply.text, reply.is_action)
            .await;
        Ok(reply)
    }

    /// Appends a turn and mirrors it to the chat log; mirror failures only warn
    async fn record_turn(&mut self, role: TurnRole, text: &str, is_action: bool) {
        let turn = match role {
            TurnRole::User => self.conversation.push_user(text),
            TurnRole::Bot => self.conversation.push_bot(text, is_action),
        };
        if !self.settings.log_chats {
            return;
        }
        let entry = self.conversation.log_entry(&turn);
        if let Err(error) = self.storage.log_chat_turn(entry).await {
            tracing::warn!(%error, session = self.conversation.session_id(), "failed to mirror chat turn");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContextOsRecord;
    use color_eyre::eyre::eyre;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned completions and records every prompt it receives
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<std::result::Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
        audio_calls: Mutex<usize>,
    }

    impl ScriptedClient {
        fn new(replies: &[std::result::Result<&str, &str>]) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .iter()
                        .map(|reply| reply.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        fn next(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(error)) => Err(eyre!(error)),
                None => Err(eyre!("script exhausted")),
            }
        }
    }

    impl CompletionClient for ScriptedClient {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.next(prompt)
        }

        async fn generate_with_audio(&self, prompt: &str, _audio: &AudioClip) -> Result<String> {
            *self.audio_calls.lock().unwrap() += 1;
            self.next(prompt)
        }
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    async fn assistant(replies: &[std::result::Result<&str, &str>]) -> AdminAssistant<ScriptedClient> {
        let storage = StorageManager::in_memory().await.unwrap();
        let mut assistant =
            AdminAssistant::new(ScriptedClient::new(replies), storage, AssistantConfig::default());
        assistant.today = fixed_today;
        assistant
    }

    #[tokio::test]
    async fn test_plain_answer_appends_both_turns() {
        let mut assistant = assistant(&[Ok("Mamy dziś trzy spotkania.")]).await;
        let reply = assistant.handle_message("Co dziś?").await.unwrap();

        assert_eq!(reply.text, "Mamy dziś trzy spotkania.");
        assert!(!reply.is_action);
        let turns = assistant.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Bot);
        assert!(!turns[1].is_action);
    }

    #[tokio::test]
    async fn test_action_reply_dispatches_and_marks_turn() {
        let mut assistant = assistant(&[Ok(
            r#"Zrobię to. {"action":"ADD_CAMPAIGN","data":{"name":"Test","budget":5000}} Dzięki!"#,
        )])
        .await;
        let reply = assistant.handle_message("Dodaj kampanię Test za 5000").await.unwrap();

        assert!(reply.is_action);
        assert_eq!(reply.action, Some("ADD_CAMPAIGN"));
        assert!(reply.text.starts_with("Zrobię to. Dzięki!"));
        assert!(!reply.text.contains("{\"action\""));
        assert!(assistant.conversation().turns()[1].is_action);

        let campaigns = assistant.storage.list_campaigns().await.unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].start_date, "2026-03-10");
        assert_eq!(campaigns[0].end_date, "2026-04-09");
    }

    #[tokio::test]
    async fn test_llm_failure_leaves_no_bot_turn() {
        let mut assistant = assistant(&[Err("503 UNAVAILABLE")]).await;
        let error = assistant.handle_message("Cześć").await.unwrap_err();

        assert!(error.to_string().contains("503"));
        let turns = assistant.conversation().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
    }

    #[tokio::test]
    async fn test_malformed_action_is_shown_raw() {
        let raw = r#"Proszę: {"action":"ADD_CAMPAIGN","data":{"name":"#;
        let mut assistant = assistant(&[Ok(raw)]).await;
        let reply = assistant.handle_message("Dodaj kampanię").await.unwrap();
        assert_eq!(reply.text, raw);
        assert!(!reply.is_action);
        assert!(assistant.storage.list_campaigns().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_uses_fresh_context_and_history() {
        let mut assistant = assistant(&[Ok("Pierwsza"), Ok("Druga")]).await;
        assistant.handle_message("Pytanie 1").await.unwrap();

        let context = ContextOsRecord {
            tone_of_voice: "Zawsze na ty".to_string(),
            ..ContextOsRecord::default()
        };
        assistant.storage.save_context_os(context).await.unwrap();
        assistant.handle_message("Pytanie 2").await.unwrap();

        let prompts = assistant.client.prompts.lock().unwrap().clone();
        assert!(!prompts[0].contains("Zawsze na ty"));
        assert!(prompts[1].contains("Zawsze na ty"));
        assert!(prompts[1].contains("Użytkownik: Pytanie 1\nAsystent: Pierwsza"));
        assert_eq!(prompts[1].matches("Pytanie 2").count(), 1);
    }

    #[tokio::test]
    async fn test_turns_are_mirrored_to_chat_log() {
        let mut assistant = assistant(&[Ok("Hej")]).await;
        assistant.handle_message("Cześć").await.unwrap();

        let session = assistant.conversation().session_id().to_string();
        let logged = assistant.storage.load_chat_session(&session).await.unwrap();
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().any(|entry| entry.role == "user" && entry.text == "Cześć"));
        assert!(logged.iter().any(|entry| entry.role == "bot" && entry.text == "Hej"));
    }

    #[tokio::test]
    async fn test_voice_message_attaches_audio() {
        let mut assistant = assistant(&[Ok(r#"{"action":"SUMMARIZE_STATS"}"#)]).await;
        let clip = AudioClip::from_bytes("audio/wav", b"RIFF");
        let reply = assistant.handle_voice(&clip).await.unwrap();

        assert!(reply.is_action);
        assert_eq!(*assistant.client.audio_calls.lock().unwrap(), 1);
        assert_eq!(assistant.conversation().turns()[0].text, VOICE_TURN_TEXT);
    }
}
