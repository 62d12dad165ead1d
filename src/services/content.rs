//! Marketing copy drafted by the model in the agency's tone of voice.

use crate::agents::CompletionClient;
use crate::app::chat::agent::extract_json_object;
use crate::storage::StorageManager;
use color_eyre::{Result, eyre::eyre};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ContentKind {
    BlogPost,
    CaseStudy,
    SocialPost,
    OfferDescription,
}

impl ContentKind {
    fn brief(self) -> &'static str {
        match self {
            ContentKind::BlogPost => {
                "artykuł blogowy (ok. 600 słów) z nagłówkami i krótkim podsumowaniem"
            }
            ContentKind::CaseStudy => {
                "szkic case study z sekcjami: wyzwanie, rozwiązanie, rezultaty"
            }
            ContentKind::SocialPost => "post na LinkedIn i Facebooka (do 120 słów) z wezwaniem do działania",
            ContentKind::OfferDescription => {
                "opis oferty dla klienta: zakres prac, korzyści i kolejne kroki"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedContent {
    #[serde(default)]
    pub title: String,
    #[serde(alias = "body")]
    pub content: String,
}

/// Builds the generation prompt; tone of voice is included when set
#[must_use]
pub fn content_prompt(kind: ContentKind, topic: &str, tone_of_voice: &str) -> String {
    let mut prompt = format!(
        "Jesteś copywriterem agencji ECM Digital. Napisz po polsku: {}.\nTemat: {}",
        kind.brief(),
        topic.trim()
    );
    if !tone_of_voice.trim().is_empty() {
        prompt.push_str(&format!("\n\nTon komunikacji:\n{}", tone_of_voice.trim()));
    }
    prompt.push_str(
        "\n\nOdpowiedz wyłącznie obiektem JSON: {\"title\":\"...\",\"content\":\"...\"}",
    );
    prompt
}

/// Reads the model reply as `{"title","content"}`, falling back to plain
/// text with the first line as the title
#[must_use]
pub fn parse_generated(raw: &str) -> GeneratedContent {
    if let Some(parsed) = extract_json_object(raw)
        .and_then(|json| serde_json::from_str::<GeneratedContent>(&json).ok())
    {
        return parsed;
    }

    let text = raw.trim();
    let (title, content) = text.split_once('\n').unwrap_or((text, ""));
    GeneratedContent {
        title: title.trim().trim_start_matches('#').trim().to_string(),
        content: content.trim().to_string(),
    }
}

pub async fn generate_content<C: CompletionClient>(
    client: &C,
    storage: &StorageManager,
    kind: ContentKind,
    topic: &str,
) -> Result<GeneratedContent> {
    if topic.trim().is_empty() {
        return Err(eyre!("Content topic is empty"));
    }
    let context = storage.load_context_os().await?;
    let prompt = content_prompt(kind, topic, &context.tone_of_voice);
    let raw = client.generate(&prompt).await?;
    Ok(parse_generated(&raw))
}
