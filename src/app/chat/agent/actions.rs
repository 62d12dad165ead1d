use crate::models::{
    CaseStudy, Campaign, CampaignStatus, Client, ClientStatus, KanbanTask, Priority, Testimonial,
    TaskStatus, now_rfc3339,
};
use crate::services::dates::{campaign_window, format_day, parse_day};
use crate::services::fuzzy::best_match;
use crate::services::slug::slugify;
use crate::services::stats::AgencyStats;
use crate::storage::StorageManager;
use chrono::NaiveDate;
use color_eyre::{Result, eyre::eyre};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Actions the assistant may ask the app to perform
#[derive(Debug, Clone, PartialEq)]
pub enum ActionIntent {
    AddCaseStudy(CaseStudyPayload),
    UpdateCaseStudy(CaseStudyUpdatePayload),
    AddCampaign(CampaignPayload),
    SummarizeStats,
    AddTask(TaskPayload),
    AddClient(ClientPayload),
    AddMeetingNotes(MeetingNotesPayload),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseStudyPayload {
    pub title: String,
    pub client: String,
    pub category: String,
    pub challenge: String,
    pub solution: String,
    #[serde(deserialize_with = "string_list")]
    pub results: Vec<String>,
    pub testimonial: Option<Testimonial>,
    #[serde(alias = "image_url")]
    pub image_url: Option<String>,
}

/// `searchTitle` picks the case study; the fields to change come either in
/// `updates` or flat next to it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseStudyUpdatePayload {
    #[serde(alias = "search_title", alias = "query")]
    pub search_title: String,
    pub updates: Map<String, Value>,
    #[serde(flatten)]
    pub inline: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CampaignPayload {
    pub name: String,
    pub platform: String,
    #[serde(deserialize_with = "amount")]
    pub budget: f64,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    pub end_date: Option<String>,
    #[serde(alias = "clientName", alias = "client_name")]
    pub client: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    #[serde(alias = "due_date")]
    pub due_date: Option<String>,
    #[serde(alias = "clientName", alias = "client_name")]
    pub client: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientPayload {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub status: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeetingNotesPayload {
    #[serde(alias = "summary", alias = "text")]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    #[serde(default)]
    data: Value,
}

impl ActionIntent {
    /// Parses `{"action": "...", "data": {...}}` and checks required fields
    pub fn parse(json: &str) -> Result<Self> {
        let raw: RawAction = serde_json::from_str(json)?;
        let data = match raw.data {
            Value::Null => Value::Object(Map::new()),
            data => data,
        };

        let intent = match raw.action.trim().to_uppercase().as_str() {
            "ADD_CASE_STUDY" => Self::AddCaseStudy(serde_json::from_value(data)?),
            "UPDATE_CASE_STUDY" => Self::UpdateCaseStudy(serde_json::from_value(data)?),
            "ADD_CAMPAIGN" => Self::AddCampaign(serde_json::from_value(data)?),
            "SUMMARIZE_STATS" => Self::SummarizeStats,
            "ADD_TASK" => Self::AddTask(serde_json::from_value(data)?),
            "ADD_CLIENT" => Self::AddClient(serde_json::from_value(data)?),
            "ADD_MEETING_NOTES" => Self::AddMeetingNotes(serde_json::from_value(data)?),
            other => return Err(eyre!("Unknown action '{}'", other)),
        };
        intent.validate()?;
        Ok(intent)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddCaseStudy(_) => "ADD_CASE_STUDY",
            Self::UpdateCaseStudy(_) => "UPDATE_CASE_STUDY",
            Self::AddCampaign(_) => "ADD_CAMPAIGN",
            Self::SummarizeStats => "SUMMARIZE_STATS",
            Self::AddTask(_) => "ADD_TASK",
            Self::AddClient(_) => "ADD_CLIENT",
            Self::AddMeetingNotes(_) => "ADD_MEETING_NOTES",
        }
    }

    fn validate(&self) -> Result<()> {
        let (field, value) = match self {
            Self::AddCaseStudy(payload) => ("title", &payload.title),
            Self::UpdateCaseStudy(payload) => {
                payload.patch()?;
                ("searchTitle", &payload.search_title)
            }
            Self::AddCampaign(payload) => ("name", &payload.name),
            Self::SummarizeStats => return Ok(()),
            Self::AddTask(payload) => ("title", &payload.title),
            Self::AddClient(payload) => ("name", &payload.name),
            Self::AddMeetingNotes(payload) => ("notes", &payload.notes),
        };
        if value.trim().is_empty() {
            return Err(eyre!("{} needs a non-empty '{}'", self.name(), field));
        }
        Ok(())
    }
}

/// Typed case study changes; a field of the wrong shape fails the whole
/// patch so nothing unreadable reaches the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseStudyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(deserialize_with = "optional_string_list", skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testimonial: Option<Testimonial>,
    #[serde(alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CaseStudyPatch {
    /// Names of the fields this patch changes
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("client", self.client.is_some()),
            ("category", self.category.is_some()),
            ("challenge", self.challenge.is_some()),
            ("solution", self.solution.is_some()),
            ("results", self.results.is_some()),
            ("testimonial", self.testimonial.is_some()),
            ("image_url", self.image_url.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

impl CaseStudyUpdatePayload {
    /// Changes from the flat fields and `updates`, the latter winning
    pub fn patch(&self) -> Result<CaseStudyPatch> {
        let mut fields = self.inline.clone();
        fields.remove("slug");
        fields.extend(self.updates.clone());
        fields.remove("slug");

        let mut patch: CaseStudyPatch = serde_json::from_value(Value::Object(fields))
            .map_err(|error| eyre!("UPDATE_CASE_STUDY has a malformed field: {}", error))?;
        if let Some(title) = &patch.title {
            patch.slug = Some(slugify(title));
        }
        Ok(patch)
    }
}

/// Runs one action against the store and returns the confirmation shown
/// to the admin. Steps run in order without a transaction; an error in a
/// later step leaves earlier writes in place.
pub async fn dispatch(
    storage: &StorageManager,
    intent: &ActionIntent,
    today: NaiveDate,
) -> Result<String> {
    tracing::info!(action = intent.name(), "dispatching assistant action");
    match intent {
        ActionIntent::AddCaseStudy(payload) => add_case_study(storage, payload).await,
        ActionIntent::UpdateCaseStudy(payload) => update_case_study(storage, payload).await,
        ActionIntent::AddCampaign(payload) => add_campaign(storage, payload, today).await,
        ActionIntent::SummarizeStats => Ok(AgencyStats::collect(storage).await?.render()),
        ActionIntent::AddTask(payload) => add_task(storage, payload, today).await,
        ActionIntent::AddClient(payload) => add_client(storage, payload).await,
        ActionIntent::AddMeetingNotes(payload) => {
            let dated = format!("[{}] {}", format_day(today), payload.notes.trim());
            storage.append_meeting_notes(&dated).await?;
            Ok("✅ Dopisano notatki ze spotkania do Context OS.".to_string())
        }
    }
}

async fn add_case_study(storage: &StorageManager, payload: &CaseStudyPayload) -> Result<String> {
    let title = payload.title.trim().to_string();
    let slug = free_case_study_slug(storage, &slugify(&title)).await?;

    let case_study = CaseStudy {
        slug: slug.clone(),
        title: title.clone(),
        client: payload.client.clone(),
        category: payload.category.clone(),
        challenge: payload.challenge.clone(),
        solution: payload.solution.clone(),
        results: payload.results.clone(),
        testimonial: payload.testimonial.clone(),
        image_url: payload.image_url.clone(),
        created_at: now_rfc3339(),
        ..CaseStudy::default()
    };
    storage.add_case_study(case_study).await?;
    Ok(format!("✅ Dodano case study „{title}” (/{slug})."))
}

/// First of `slug`, `slug-2`, `slug-3`... not used by another case study
async fn free_case_study_slug(storage: &StorageManager, slug: &str) -> Result<String> {
    let mut candidate = slug.to_string();
    let mut suffix = 2;
    while storage.get_case_study_by_slug(&candidate).await?.is_some() {
        candidate = format!("{slug}-{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}

async fn update_case_study(
    storage: &StorageManager,
    payload: &CaseStudyUpdatePayload,
) -> Result<String> {
    let case_studies = storage.list_case_studies().await?;
    let Some((target, score)) =
        best_match(&payload.search_title, &case_studies, |case_study| case_study.title.as_str())
    else {
        return Ok(format!(
            "⚠️ Nie znalazłem case study pasującego do „{}”. Niczego nie zmieniono.",
            payload.search_title
        ));
    };

    tracing::debug!(id = %target.id, score, "fuzzy matched case study");
    apply_case_study_update(storage, target, payload).await
}

/// Merges the payload's changes into an already chosen case study
async fn apply_case_study_update(
    storage: &StorageManager,
    target: &CaseStudy,
    payload: &CaseStudyUpdatePayload,
) -> Result<String> {
    let patch = payload.patch()?;
    let changed = patch.changed_fields();
    if changed.is_empty() {
        return Ok(format!(
            "⚠️ Brak pól do zmiany w case study „{}”.",
            target.title
        ));
    }

    // The list may be stale; a record removed since then is reported, not recreated.
    match storage.update_case_study(&target.id, serde_json::to_value(&patch)?).await? {
        Some(updated) => Ok(format!(
            "✅ Zaktualizowano case study „{}” (pola: {}).",
            updated.title,
            changed.join(", ")
        )),
        None => Ok(format!(
            "⚠️ Case study „{}” zostało usunięte w międzyczasie. Niczego nie zmieniono.",
            target.title
        )),
    }
}

async fn add_campaign(
    storage: &StorageManager,
    payload: &CampaignPayload,
    today: NaiveDate,
) -> Result<String> {
    let start = payload.start_date.as_deref().and_then(|value| parse_day(value, today));
    let end = payload.end_date.as_deref().and_then(|value| parse_day(value, today));
    let window = campaign_window(start, end, today);

    let (client_id, client_note) = resolve_client(storage, payload.client.as_deref()).await?;

    let campaign = Campaign {
        name: payload.name.trim().to_string(),
        client_id,
        platform: payload.platform.clone(),
        status: CampaignStatus::Active,
        budget: payload.budget,
        spent: 0.0,
        start_date: format_day(window.start),
        end_date: format_day(window.end),
        notes: payload.notes.clone(),
        ..Campaign::default()
    };
    storage.add_campaign(campaign.clone()).await?;

    Ok(format!(
        "✅ Utworzono kampanię „{}” (budżet {:.2} PLN, od {} do {}){}.",
        campaign.name, campaign.budget, campaign.start_date, campaign.end_date, client_note
    ))
}

async fn add_task(storage: &StorageManager, payload: &TaskPayload, today: NaiveDate) -> Result<String> {
    let priority = payload
        .priority
        .as_deref()
        .and_then(|value| value.parse::<Priority>().ok())
        .unwrap_or_default();
    let due_date = payload
        .due_date
        .as_deref()
        .and_then(|value| parse_day(value, today))
        .map(format_day);
    let (client_id, client_note) = resolve_client(storage, payload.client.as_deref()).await?;

    let task = KanbanTask {
        description: payload.description.clone(),
        status: TaskStatus::Todo,
        priority,
        assignee: payload.assignee.clone().filter(|name| !name.trim().is_empty()),
        client_id,
        due_date,
        ..KanbanTask::new(payload.title.trim())
    };
    storage.add_task(task.clone()).await?;

    let due = task
        .due_date
        .as_deref()
        .map(|day| format!(", termin {day}"))
        .unwrap_or_default();
    Ok(format!(
        "✅ Dodano zadanie „{}” do kolumny {} (priorytet {}{}){}.",
        task.title, task.status, task.priority, due, client_note
    ))
}

async fn add_client(storage: &StorageManager, payload: &ClientPayload) -> Result<String> {
    let status = payload
        .status
        .as_deref()
        .and_then(|value| value.parse::<ClientStatus>().ok())
        .unwrap_or_default();
    let client = Client {
        company: payload.company.clone(),
        email: payload.email.clone(),
        phone: payload.phone.clone(),
        status,
        notes: payload.notes.clone(),
        ..Client::new(payload.name.trim())
    };
    let name = client.display_name().to_string();
    storage.add_client(client).await?;
    Ok(format!("✅ Dodano klienta „{name}” ({status})."))
}

/// Links a record to a client named in the payload, if one matches
async fn resolve_client(
    storage: &StorageManager,
    name: Option<&str>,
) -> Result<(Option<String>, String)> {
    let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) else {
        return Ok((None, String::new()));
    };
    match storage.find_client_by_name(name).await? {
        Some(client) => Ok((Some(client.id.clone()), format!(", klient: {}", client.display_name()))),
        None => Ok((None, format!(", nie znaleziono klienta „{name}”"))),
    }
}

/// Catalogue of actions included in the system instruction
#[must_use]
pub fn action_schema() -> String {
    r#"
DOSTĘPNE AKCJE (gdy użytkownik prosi o zmianę danych, dołącz DOKŁADNIE JEDEN obiekt JSON):

1. ADD_CASE_STUDY: nowe case study
   {"action":"ADD_CASE_STUDY","data":{"title":"...","client":"...","category":"...","challenge":"...","solution":"...","results":["..."],"testimonial":{"quote":"...","author":"...","role":"..."}}}

2. UPDATE_CASE_STUDY: zmiana istniejącego case study (wyszukiwane po tytule)
   {"action":"UPDATE_CASE_STUDY","data":{"searchTitle":"fragment tytułu","updates":{"results":["..."]}}}

3. ADD_CAMPAIGN: nowa kampania marketingowa (domyślnie start dziś, koniec za 30 dni)
   {"action":"ADD_CAMPAIGN","data":{"name":"...","platform":"Google Ads","budget":5000,"startDate":"RRRR-MM-DD","endDate":"RRRR-MM-DD","client":"nazwa klienta"}}

4. SUMMARIZE_STATS: podsumowanie klientów, ofert, kampanii i zadań
   {"action":"SUMMARIZE_STATS"}

5. ADD_TASK: nowe zadanie na tablicy kanban
   {"action":"ADD_TASK","data":{"title":"...","description":"...","priority":"low|medium|high","assignee":"...","dueDate":"RRRR-MM-DD"}}

6. ADD_CLIENT: nowy klient
   {"action":"ADD_CLIENT","data":{"name":"...","company":"...","email":"...","phone":"..."}}

7. ADD_MEETING_NOTES: dopisanie notatek ze spotkania do Context OS
   {"action":"ADD_MEETING_NOTES","data":{"notes":"..."}}

ZASADY:
- Obiekt JSON zawsze zaczyna się od {"action"
- Możesz dodać krótkie zdanie przed lub po JSON
- Jeśli użytkownik tylko pyta, odpowiedz normalnie, bez JSON
"#
    .trim()
    .to_string()
}

/// Number, or a string like `"5 000"` / `"1500,50 zł"`
fn amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| D::Error::custom("amount out of range")),
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .trim_end_matches("PLN")
                .trim_end_matches("zł")
                .chars()
                .filter(|character| !character.is_whitespace())
                .collect::<String>()
                .replace(',', ".");
            cleaned
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("not an amount: '{text}'")))
        }
        other => Err(D::Error::custom(format!("not an amount: {other}"))),
    }
}

fn optional_string_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(single) => Ok(Some(vec![single])),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Ok(text),
                other => Err(D::Error::custom(format!("not a result line: {other}"))),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Some),
        other => Err(D::Error::custom(format!("not a list of results: {other}"))),
    }
}

/// List of strings, tolerating a single string
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(single) => Ok(vec![single]),
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .collect()),
        other => Err(D::Error::custom(format!("expected a list, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::chat::agent::json::extract_action;
    use chrono::Duration;

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    async fn store_with_case_studies(titles: &[&str]) -> StorageManager {
        let storage = StorageManager::in_memory().await.unwrap();
        for title in titles {
            storage
                .add_case_study(CaseStudy {
                    slug: slugify(title),
                    title: (*title).to_string(),
                    results: vec!["+20% ruchu".to_string()],
                    created_at: now_rfc3339(),
                    ..CaseStudy::default()
                })
                .await
                .unwrap();
        }
        storage
    }

    #[test]
    fn test_parse_tolerates_loose_payloads() {
        let intent = ActionIntent::parse(
            r#"{"action":"add_campaign","data":{"name":"Jesień","budget":"5 000,50 zł","start_date":"2026-10-01"}}"#,
        )
        .unwrap();
        match intent {
            ActionIntent::AddCampaign(payload) => {
                assert!((payload.budget - 5000.5).abs() < 0.001);
                assert_eq!(payload.start_date.as_deref(), Some("2026-10-01"));
            }
            other => panic!("unexpected intent {other:?}"),
        }

        let intent = ActionIntent::parse(
            r#"{"action":"ADD_CASE_STUDY","data":{"title":"Sklep","results":"+30% konwersji"}}"#,
        )
        .unwrap();
        match intent {
            ActionIntent::AddCaseStudy(payload) => assert_eq!(payload.results, vec!["+30% konwersji"]),
            other => panic!("unexpected intent {other:?}"),
        }

        assert_eq!(
            ActionIntent::parse(r#"{"action":"SUMMARIZE_STATS","data":{}}"#).unwrap(),
            ActionIntent::SummarizeStats
        );
        assert_eq!(
            ActionIntent::parse(r#"{"action":"SUMMARIZE_STATS","data":null}"#).unwrap(),
            ActionIntent::SummarizeStats
        );
    }

    #[test]
    fn test_parse_rejects_missing_required_fields() {
        assert!(ActionIntent::parse(r#"{"action":"ADD_CAMPAIGN","data":{"budget":100}}"#).is_err());
        assert!(ActionIntent::parse(r#"{"action":"ADD_TASK","data":{"title":"  "}}"#).is_err());
        assert!(ActionIntent::parse(r#"{"action":"ADD_MEETING_NOTES"}"#).is_err());
        assert!(ActionIntent::parse(r#"{"action":"ADD_CAMPAIGN","data":{"name":"x","budget":[1]}}"#).is_err());
    }

    #[test]
    fn test_update_patch_maps_fields() {
        let payload: CaseStudyUpdatePayload = serde_json::from_value(serde_json::json!({
            "searchTitle": "piekarnia",
            "updates": { "title": "Nowa Piekarnia", "results": "+50%" },
            "imageUrl": "https://example.test/a.png",
            "unknown": 1
        }))
        .unwrap();
        let patch = payload.patch().unwrap();
        assert_eq!(patch.slug.as_deref(), Some("nowa-piekarnia"));
        assert_eq!(patch.results, Some(vec!["+50%".to_string()]));
        assert_eq!(patch.image_url.as_deref(), Some("https://example.test/a.png"));
        assert_eq!(patch.changed_fields(), vec!["title", "results", "image_url"]);

        let stored = serde_json::to_value(&patch).unwrap();
        assert_eq!(stored["slug"], "nowa-piekarnia");
        assert!(stored.get("unknown").is_none());
        assert!(stored.get("testimonial").is_none());
    }

    #[test]
    fn test_update_with_misshapen_fields_is_not_an_action() {
        for updates in [
            r#"{"testimonial":"Super robota - Anna, CEO"}"#,
            r#"{"title":42}"#,
            r#"{"results":[{"metric":"+20%"}]}"#,
        ] {
            let json = format!(
                r#"{{"action":"UPDATE_CASE_STUDY","data":{{"searchTitle":"sklep","updates":{updates}}}}}"#
            );
            assert!(ActionIntent::parse(&json).is_err(), "accepted {updates}");
        }
    }

    #[tokio::test]
    async fn test_misshapen_update_leaves_case_studies_readable() {
        let storage = store_with_case_studies(&["Sklep internetowy dla piekarni"]).await;
        let intent = ActionIntent::UpdateCaseStudy(
            serde_json::from_value(serde_json::json!({
                "searchTitle": "sklep piekarni",
                "updates": { "testimonial": "Super robota - Anna, CEO", "category": "E-commerce" }
            }))
            .unwrap(),
        );

        assert!(dispatch(&storage, &intent, day("2026-03-10")).await.is_err());

        let all = storage.list_case_studies().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, "");
        assert!(all[0].testimonial.is_none());
    }

    #[tokio::test]
    async fn test_update_of_deleted_case_study_is_reported() {
        let storage = store_with_case_studies(&["Sklep internetowy dla piekarni"]).await;
        let target = storage.list_case_studies().await.unwrap().remove(0);
        storage.delete_case_study(&target.id).await.unwrap();

        let payload: CaseStudyUpdatePayload = serde_json::from_value(serde_json::json!({
            "searchTitle": "sklep",
            "updates": { "category": "E-commerce" }
        }))
        .unwrap();
        let confirmation = apply_case_study_update(&storage, &target, &payload).await.unwrap();

        assert!(confirmation.contains("usunięte w międzyczasie"));
        assert!(storage.list_case_studies().await.unwrap().is_empty());
        assert!(storage.get_case_study(&target.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_campaign_from_polish_reply() {
        let storage = StorageManager::in_memory().await.unwrap();
        let today = day("2026-03-10");
        let extracted = extract_action(
            r#"Zrobię to. {"action":"ADD_CAMPAIGN","data":{"name":"Test","budget":5000}} Dzięki!"#,
        )
        .unwrap();

        let confirmation = dispatch(&storage, &extracted.intent, today).await.unwrap();
        assert!(confirmation.contains("Test"));

        let campaigns = storage.list_campaigns().await.unwrap();
        assert_eq!(campaigns.len(), 1);
        let campaign = &campaigns[0];
        assert_eq!(campaign.name, "Test");
        assert!((campaign.budget - 5000.0).abs() < f64::EPSILON);
        assert!(campaign.spent.abs() < f64::EPSILON);
        assert_eq!(campaign.status, CampaignStatus::Active);
        assert_eq!(campaign.start_date, "2026-03-10");
        assert_eq!(campaign.end_date, format_day(today + Duration::days(30)));
        assert_eq!(campaign.client_id, None);
    }

    #[tokio::test]
    async fn test_add_campaign_links_client_and_dates() {
        let storage = StorageManager::in_memory().await.unwrap();
        let client_id = storage
            .add_client(Client {
                company: "Łódzka Piekarnia".to_string(),
                ..Client::new("Anna Nowak")
            })
            .await
            .unwrap();
        let intent = ActionIntent::AddCampaign(CampaignPayload {
            name: "Pieczywo na jesień".to_string(),
            budget: 1200.0,
            start_date: Some("jutro".to_string()),
            client: Some("lodzka piekarnia".to_string()),
            ..CampaignPayload::default()
        });

        let confirmation = dispatch(&storage, &intent, day("2026-03-10")).await.unwrap();
        assert!(confirmation.contains("Łódzka Piekarnia"));

        let campaign = storage.list_campaigns().await.unwrap().remove(0);
        assert_eq!(campaign.client_id.as_deref(), Some(client_id.as_str()));
        assert_eq!(campaign.start_date, "2026-03-11");
        assert_eq!(campaign.end_date, "2026-04-10");
    }

    #[tokio::test]
    async fn test_add_case_study_slug_from_title() {
        let storage = store_with_case_studies(&["Sklep dla Łódzkiej Piekarni"]).await;
        let intent = ActionIntent::parse(
            r#"{"action":"ADD_CASE_STUDY","data":{"title":"Sklep dla Łódzkiej Piekarni","testimonial":{"quote":"Super","author":"Anna","role":"CEO"}}}"#,
        )
        .unwrap();

        let confirmation = dispatch(&storage, &intent, day("2026-03-10")).await.unwrap();
        assert!(confirmation.contains("sklep-dla-lodzkiej-piekarni-2"));

        let created = storage
            .get_case_study_by_slug("sklep-dla-lodzkiej-piekarni-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.testimonial.unwrap().author, "Anna");
    }

    #[tokio::test]
    async fn test_update_case_study_merges_into_best_match() {
        let storage = store_with_case_studies(&[
            "Aplikacja mobilna dla klubu fitness",
            "Sklep internetowy dla piekarni",
        ])
        .await;
        let intent = ActionIntent::parse(
            r#"{"action":"UPDATE_CASE_STUDY","data":{"searchTitle":"sklep piekarni","updates":{"results":["+40% sprzedaży online"],"category":"E-commerce"}}}"#,
        )
        .unwrap();

        let confirmation = dispatch(&storage, &intent, day("2026-03-10")).await.unwrap();
        assert!(confirmation.contains("Sklep internetowy dla piekarni"));

        let updated = storage
            .get_case_study_by_slug("sklep-internetowy-dla-piekarni")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.results, vec!["+40% sprzedaży online"]);
        assert_eq!(updated.category, "E-commerce");

        let untouched = storage
            .get_case_study_by_slug("aplikacja-mobilna-dla-klubu-fitness")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.results, vec!["+20% ruchu"]);
    }

    #[tokio::test]
    async fn test_update_case_study_without_match_writes_nothing() {
        let storage = store_with_case_studies(&["Aplikacja mobilna dla klubu fitness"]).await;
        let intent = ActionIntent::parse(
            r#"{"action":"UPDATE_CASE_STUDY","data":{"searchTitle":"kampania seo xyz","updates":{"category":"SEO"}}}"#,
        )
        .unwrap();

        let confirmation = dispatch(&storage, &intent, day("2026-03-10")).await.unwrap();
        assert!(confirmation.contains("Nie znalazłem"));

        let all = storage.list_case_studies().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, "");
    }

    #[tokio::test]
    async fn test_add_task_goes_to_todo() {
        let storage = StorageManager::in_memory().await.unwrap();
        let intent = ActionIntent::parse(
            r#"{"action":"ADD_TASK","data":{"title":"Przygotować makiety","priority":"high","dueDate":"za 3 dni"}}"#,
        )
        .unwrap();

        dispatch(&storage, &intent, day("2026-03-10")).await.unwrap();

        let tasks = storage.tasks_by_status(TaskStatus::Todo).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[0].due_date.as_deref(), Some("2026-03-13"));
    }

    #[tokio::test]
    async fn test_out_of_calendar_dates_fall_back() {
        let storage = StorageManager::in_memory().await.unwrap();
        let today = day("2026-03-10");
        let task = ActionIntent::parse(
            r#"{"action":"ADD_TASK","data":{"title":"Kiedyś","dueDate":"za 999999999 dni"}}"#,
        )
        .unwrap();
        dispatch(&storage, &task, today).await.unwrap();
        assert_eq!(storage.list_tasks().await.unwrap()[0].due_date, None);

        let campaign = ActionIntent::parse(
            r#"{"action":"ADD_CAMPAIGN","data":{"name":"Daleko","budget":100,"startDate":"in 999999999 days"}}"#,
        )
        .unwrap();
        dispatch(&storage, &campaign, today).await.unwrap();
        let campaign = storage.list_campaigns().await.unwrap().remove(0);
        assert_eq!(campaign.start_date, "2026-03-10");
        assert_eq!(campaign.end_date, "2026-04-09");
    }

    #[tokio::test]
    async fn test_summarize_stats_reads_four_collections() {
        let storage = StorageManager::in_memory().await.unwrap();
        storage.add_client(Client::new("Anna")).await.unwrap();
        storage.add_task(KanbanTask::new("Logo")).await.unwrap();

        let report = dispatch(&storage, &ActionIntent::SummarizeStats, day("2026-03-10"))
            .await
            .unwrap();
        assert!(report.contains("Klienci: 1"));
        assert!(report.contains("Zadania: 1 otwartych"));
    }

    #[tokio::test]
    async fn test_add_client_and_meeting_notes() {
        let storage = StorageManager::in_memory().await.unwrap();
        let intent = ActionIntent::parse(
            r#"{"action":"ADD_CLIENT","data":{"name":"Jan Kowalski","company":"Kowalski Sp. z o.o.","status":"active"}}"#,
        )
        .unwrap();
        dispatch(&storage, &intent, day("2026-03-10")).await.unwrap();
        let clients = storage.list_clients().await.unwrap();
        assert_eq!(clients[0].status, ClientStatus::Active);

        let intent = ActionIntent::parse(
            r#"{"action":"ADD_MEETING_NOTES","data":{"summary":"Klient chce landing page"}}"#,
        )
        .unwrap();
        dispatch(&storage, &intent, day("2026-03-10")).await.unwrap();
        let context = storage.load_context_os().await.unwrap();
        assert_eq!(context.meeting_notes, "[2026-03-10] Klient chce landing page");
    }

    #[test]
    fn test_schema_examples_parse() {
        let schema = action_schema();
        let parsed = schema
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("{\"action\""))
            .filter_map(|line| ActionIntent::parse(line).ok())
            .count();
        assert_eq!(parsed, 7);
    }
}
