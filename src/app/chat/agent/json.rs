//! Pulls inline JSON out of free-form model output.
//!
//! Models wrap action JSON in prose ("Zrobię to. {...} Dzięki!") and nest
//! objects inside the payload, so the object is found by scanning for its
//! balanced closing brace instead of pattern matching.

use crate::app::chat::agent::actions::ActionIntent;
use std::ops::Range;

/// Marker the model is told to start every action object with
pub const ACTION_MARKER: &str = "{\"action\"";

/// An action found in model output, with the prose around it
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAction {
    pub intent: ActionIntent,
    /// Byte range of the JSON object in the scanned text
    pub span: Range<usize>,
    /// Surrounding prose with the object cut out
    pub remaining_text: String,
}

/// Returns the exclusive end of the object opening at `start`.
///
/// `start` must point at a `{`. Braces inside string literals are ignored.
/// `None` means the object is never closed.
#[must_use]
pub fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (offset, &byte) in bytes.iter().enumerate().skip(start) {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match byte {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// First balanced `{...}` object in the text, whatever it contains
#[must_use]
pub fn extract_json_object(value: &str) -> Option<String> {
    let start = value.find('{')?;
    let end = balanced_object_end(value, start)?;
    value.get(start..end).map(str::to_string)
}

/// Raw span of the first `{"action"...}` object, before any parsing
#[must_use]
pub fn find_action_span(text: &str) -> Option<Range<usize>> {
    let start = text.find(ACTION_MARKER)?;
    let end = balanced_object_end(text, start)?;
    Some(start..end)
}

/// Finds and parses the first action object in `text`.
///
/// Anything that is not a complete, valid, known action yields `None`;
/// the caller then shows the model's text unchanged.
#[must_use]
pub fn extract_action(text: &str) -> Option<ExtractedAction> {
    let span = find_action_span(text)?;
    let json = text.get(span.clone())?;
    let intent = match ActionIntent::parse(json) {
        Ok(intent) => intent,
        Err(error) => {
            tracing::debug!(%error, "ignoring unparseable action object");
            return None;
        }
    };

    let before = text.get(..span.start).unwrap_or_default().trim();
    let after = text.get(span.end..).unwrap_or_default().trim();
    let remaining_text = [before, after]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    Some(ExtractedAction {
        intent,
        span,
        remaining_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::chat::agent::actions::{CampaignPayload, CaseStudyPayload};

    #[test]
    fn test_campaign_action_in_polish_prose() {
        let text = r#"Zrobię to. {"action":"ADD_CAMPAIGN","data":{"name":"Test","budget":5000}} Dzięki!"#;
        let extracted = extract_action(text).unwrap();
        assert_eq!(
            text.get(extracted.span.clone()).unwrap(),
            r#"{"action":"ADD_CAMPAIGN","data":{"name":"Test","budget":5000}}"#
        );
        match extracted.intent {
            ActionIntent::AddCampaign(CampaignPayload { name, budget, .. }) => {
                assert_eq!(name, "Test");
                assert!((budget - 5000.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected intent {other:?}"),
        }
        assert_eq!(extracted.remaining_text, "Zrobię to. Dzięki!");
    }

    #[test]
    fn test_nested_payload_is_not_truncated() {
        let json = r#"{"action":"ADD_CASE_STUDY","data":{"title":"Sklep piekarni","testimonial":{"quote":"Świetna robota {serio}","author":"Anna","role":"CEO"},"results":["+40% sprzedaży"]}}"#;
        for text in [
            json.to_string(),
            format!("Dodaję case study:\n{json}\nGotowe."),
            format!("{json}{json}"),
        ] {
            let span = find_action_span(&text).unwrap();
            assert_eq!(text.get(span).unwrap(), json);
        }

        let extracted = extract_action(json).unwrap();
        match extracted.intent {
            ActionIntent::AddCaseStudy(CaseStudyPayload { testimonial, .. }) => {
                let testimonial = testimonial.unwrap();
                assert_eq!(testimonial.quote, "Świetna robota {serio}");
                assert_eq!(testimonial.role, "CEO");
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let text = r#"ok {"action":"ADD_TASK","data":{"title":"Napisz \"}\" w stopce"}} koniec"#;
        let extracted = extract_action(text).unwrap();
        assert_eq!(extracted.remaining_text, "ok koniec");
        match extracted.intent {
            ActionIntent::AddTask(payload) => assert_eq!(payload.title, "Napisz \"}\" w stopce"),
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn test_truncated_json_is_no_action() {
        assert!(extract_action(r#"Jasne {"action":"ADD_CAMPAIGN","data":{"name":"Test""#).is_none());
        assert!(find_action_span(r#"{"action":"ADD_TASK","data":{"title":"x"}"#).is_none());
    }

    #[test]
    fn test_malformed_json_is_no_action() {
        assert!(extract_action(r#"{"action":"ADD_CAMPAIGN","data":{name:Test}}"#).is_none());
        assert!(extract_action(r#"{"action":"ADD_CAMPAIGN",,}"#).is_none());
    }

    #[test]
    fn test_unknown_action_is_no_action() {
        assert!(extract_action(r#"{"action":"DROP_DATABASE","data":{}}"#).is_none());
    }

    #[test]
    fn test_text_without_action() {
        assert!(extract_action("Kampania trwa do końca miesiąca.").is_none());
        assert!(extract_action(r#"Przykład: {"name":"Test"}"#).is_none());
        assert!(extract_action("").is_none());
    }

    #[test]
    fn test_only_first_action_counts() {
        let text = r#"{"action":"SUMMARIZE_STATS"} i jeszcze {"action":"ADD_TASK","data":{"title":"x"}}"#;
        let extracted = extract_action(text).unwrap();
        assert_eq!(extracted.intent, ActionIntent::SummarizeStats);
        assert!(extracted.remaining_text.contains("ADD_TASK"));
    }

    #[test]
    fn test_extract_generic_object() {
        let text = "Oto wynik:\n```json\n{\"title\":\"A\",\"meta\":{\"tags\":[\"b\"]}}\n```";
        assert_eq!(
            extract_json_object(text).unwrap(),
            "{\"title\":\"A\",\"meta\":{\"tags\":[\"b\"]}}"
        );
        assert!(extract_json_object("brak").is_none());
    }

    #[test]
    fn test_balanced_end_requires_brace_at_start() {
        assert_eq!(balanced_object_end("x{}", 0), None);
        assert_eq!(balanced_object_end("x{}", 1), Some(3));
        assert_eq!(balanced_object_end("{{}", 0), None);
    }
}
