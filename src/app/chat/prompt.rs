use crate::app::chat::agent::actions::action_schema;
use crate::app::chat::conversation::{ConversationTurn, TurnRole};
use crate::models::ContextOsRecord;
use crate::services::dates::format_day;
use chrono::NaiveDate;

pub const SYSTEM_INSTRUCTION: &str = "Jesteś asystentem AI panelu administracyjnego agencji ECM Digital. \
Pomagasz zespołowi zarządzać klientami, ofertami, kampaniami, zadaniami i case studies. \
Odpowiadasz po polsku, zwięźle i konkretnie.";

/// Context OS sections in prompt order, with their headers
fn context_sections(context: &ContextOsRecord) -> [(&'static str, &str); 5] {
    [
        ("Ton komunikacji (tone of voice)", context.tone_of_voice.as_str()),
        ("Procedury (SOP)", context.sops.as_str()),
        ("Cele biznesowe", context.business_goals.as_str()),
        ("Notatki ze spotkań", context.meeting_notes.as_str()),
        ("Dodatkowe instrukcje", context.custom_instructions.as_str()),
    ]
}

/// Context OS block, or `None` when every field is empty
#[must_use]
pub fn context_block(context: &ContextOsRecord) -> Option<String> {
    let sections: Vec<String> = context_sections(context)
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(header, value)| format!("## {header}\n{}", value.trim()))
        .collect();
    if sections.is_empty() {
        return None;
    }
    Some(format!("=== CONTEXT OS ===\n{}", sections.join("\n\n")))
}

fn history_block(history: &[ConversationTurn]) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    let lines = history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                TurnRole::User => "Użytkownik",
                TurnRole::Bot => "Asystent",
            };
            format!("{speaker}: {}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("=== HISTORIA ROZMOWY ===\n{lines}"))
}

/// Assembles the single prompt sent to the model: system instruction with
/// the action catalogue, Context OS, history, then the new message.
#[must_use]
pub fn build_prompt(
    message: &str,
    history: &[ConversationTurn],
    context: &ContextOsRecord,
    today: NaiveDate,
) -> String {
    let mut blocks = vec![
        SYSTEM_INSTRUCTION.to_string(),
        format!("Dzisiejsza data: {}", format_day(today)),
        action_schema(),
    ];
    if let Some(context) = context_block(context) {
        blocks.push(context);
    }
    if let Some(history) = history_block(history) {
        blocks.push(history);
    }
    blocks.push(format!("Użytkownik: {message}"));
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::chat::conversation::Conversation;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn test_empty_context_is_omitted() {
        let prompt = build_prompt("Cześć", &[], &ContextOsRecord::default(), today());
        assert!(!prompt.contains("CONTEXT OS"));
        assert!(!prompt.contains("HISTORIA ROZMOWY"));
        assert!(prompt.starts_with(SYSTEM_INSTRUCTION));
        assert!(prompt.contains("Dzisiejsza data: 2026-03-10"));
        assert!(prompt.ends_with("Użytkownik: Cześć"));
    }

    #[test]
    fn test_only_filled_fields_get_headers() {
        let context = ContextOsRecord {
            tone_of_voice: "Luźny, ale profesjonalny".to_string(),
            business_goals: "   ".to_string(),
            meeting_notes: "Klient X chce sklep".to_string(),
            ..ContextOsRecord::default()
        };
        let prompt = build_prompt("Co dalej?", &[], &context, today());
        assert!(prompt.contains("## Ton komunikacji (tone of voice)\nLuźny, ale profesjonalny"));
        assert!(prompt.contains("## Notatki ze spotkań\nKlient X chce sklep"));
        assert!(!prompt.contains("Cele biznesowe"));
        assert!(!prompt.contains("Procedury"));
        assert!(!prompt.contains("Dodatkowe instrukcje"));
    }

    #[test]
    fn test_blocks_are_ordered() {
        let mut conversation = Conversation::with_session_id("s1");
        conversation.push_user("Pokaż statystyki");
        conversation.push_bot("Klienci: 3", true);
        let context = ContextOsRecord {
            sops: "Oferty wysyłamy w 48h".to_string(),
            ..ContextOsRecord::default()
        };

        let prompt = build_prompt("A kampanie?", conversation.turns(), &context, today());
        let system = prompt.find(SYSTEM_INSTRUCTION).unwrap();
        let actions = prompt.find("ADD_CAMPAIGN").unwrap();
        let context = prompt.find("=== CONTEXT OS ===").unwrap();
        let history = prompt.find("=== HISTORIA ROZMOWY ===").unwrap();
        let message = prompt.rfind("Użytkownik: A kampanie?").unwrap();
        assert!(system < actions && actions < context && context < history && history < message);
        assert!(prompt.contains("Użytkownik: Pokaż statystyki\nAsystent: Klienci: 3"));
    }
}
