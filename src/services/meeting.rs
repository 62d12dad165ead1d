use crate::agents::CompletionClient;
use crate::services::dates::format_day;
use crate::storage::StorageManager;
use chrono::NaiveDate;
use color_eyre::{Result, eyre::eyre};

const MEETING_INSTRUCTION: &str = "Przeanalizuj poniższą transkrypcję spotkania agencji ECM Digital. \
Napisz zwięzłe podsumowanie po polsku w punktach: ustalenia, zadania do wykonania (z osobą \
odpowiedzialną, jeśli padła), terminy oraz otwarte pytania. Nie dodawaj wstępu ani JSON.";

/// Summarises a meeting transcript and appends the dated summary to the
/// Context OS meeting notes. Returns the summary.
pub async fn analyze_meeting<C: CompletionClient>(
    client: &C,
    storage: &StorageManager,
    transcript: &str,
    today: NaiveDate,
) -> Result<String> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(eyre!("Meeting transcript is empty"));
    }

    let prompt = format!("{MEETING_INSTRUCTION}\n\n=== TRANSKRYPCJA ===\n{transcript}");
    let summary = client.generate(&prompt).await?.trim().to_string();
    storage
        .append_meeting_notes(&format!("[{}] Spotkanie\n{}", format_day(today), summary))
        .await?;
    tracing::info!(summary_chars = summary.len(), "stored meeting summary");
    Ok(summary)
}
