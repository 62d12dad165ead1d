use chrono::{Local, NaiveDate, TimeDelta};

/// Days a campaign runs when the request names no end date
pub const DEFAULT_CAMPAIGN_DAYS: i64 = 30;

/// Inclusive date range, used for campaign windows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date_in_range(date, *self)
    }
}

#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Storage format for calendar days
#[must_use]
pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Resolves a campaign window relative to `today`.
/// Missing start is today, missing end is start + 30 days
/// (or start itself at the very end of the calendar).
#[must_use]
pub fn campaign_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> DateRange {
    let start = start.unwrap_or(today);
    let end = end
        .or_else(|| shift_days(start, DEFAULT_CAMPAIGN_DAYS))
        .unwrap_or(start);
    DateRange { start, end }
}

/// Parses a day the way the assistant and admins write them:
/// `2026-03-01`, `01.03.2026`, an RFC 3339 timestamp, or a relative word
/// (`dziś`, `jutro`, `today`, `tomorrow`, `za 3 dni`, `in 3 days`).
#[must_use]
pub fn parse_day(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d.%m.%Y") {
        return Some(date);
    }
    if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.date_naive());
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "dziś" | "dzis" | "dzisiaj" | "today" => return Some(today),
        "jutro" | "tomorrow" => return shift_days(today, 1),
        "wczoraj" | "yesterday" => return shift_days(today, -1),
        _ => {}
    }

    parse_day_offset(&lowered).and_then(|offset| shift_days(today, offset))
}

/// `date` moved by `days`, or `None` past the representable calendar
fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(TimeDelta::try_days(days)?)
}

// "za 3 dni", "in 3 days", "5 days ago", "5 dni temu"
fn parse_day_offset(text: &str) -> Option<i64> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    for window in tokens.windows(3) {
        match window {
            [number, "days" | "day" | "dni" | "dzień", "ago" | "temu"] => {
                if let Ok(value) = number.parse::<i64>() {
                    return value.checked_neg();
                }
            }
            ["in" | "za", number, "days" | "day" | "dni" | "dzień"] => {
                if let Ok(value) = number.parse::<i64>() {
                    return Some(value);
                }
            }
            _ => {}
        }
    }

    None
}

/// Checks if a date falls within a range (inclusive)
#[must_use]
pub fn date_in_range(date: NaiveDate, range: DateRange) -> bool {
    date >= range.start && date <= range.end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_campaign_window_defaults() {
        let today = day("2026-01-15");
        let window = campaign_window(None, None, today);
        assert_eq!(window.start, today);
        assert_eq!(window.end, day("2026-02-14"));
    }

    #[test]
    fn test_campaign_window_keeps_explicit_dates() {
        let today = day("2026-01-15");
        let window = campaign_window(Some(day("2026-03-01")), None, today);
        assert_eq!(window.end, day("2026-03-31"));

        let window = campaign_window(None, Some(day("2026-01-20")), today);
        assert_eq!(window.start, today);
        assert_eq!(window.end, day("2026-01-20"));
    }

    #[test]
    fn test_parse_day_formats() {
        let today = day("2026-01-15");
        assert_eq!(parse_day("2026-03-01", today), Some(day("2026-03-01")));
        assert_eq!(parse_day("01.03.2026", today), Some(day("2026-03-01")));
        assert_eq!(
            parse_day("2026-03-01T10:00:00+01:00", today),
            Some(day("2026-03-01"))
        );
        assert_eq!(parse_day("", today), None);
        assert_eq!(parse_day("kiedyś", today), None);
    }

    #[test]
    fn test_parse_day_relative() {
        let today = day("2026-01-15");
        assert_eq!(parse_day("Jutro", today), Some(day("2026-01-16")));
        assert_eq!(parse_day("today", today), Some(today));
        assert_eq!(parse_day("za 3 dni", today), Some(day("2026-01-18")));
        assert_eq!(parse_day("in 10 days", today), Some(day("2026-01-25")));
        assert_eq!(parse_day("5 dni temu", today), Some(day("2026-01-10")));
    }

    #[test]
    fn test_huge_offsets_are_not_dates() {
        let today = day("2026-03-10");
        assert_eq!(parse_day("za 999999999 dni", today), None);
        assert_eq!(parse_day("999999999999999 dni temu", today), None);
        assert_eq!(parse_day(&format!("in {} days", i64::MAX), today), None);
        assert_eq!(parse_day(&format!("{} days ago", i64::MIN), today), None);
    }

    #[test]
    fn test_campaign_window_at_calendar_end() {
        let window = campaign_window(Some(NaiveDate::MAX), None, day("2026-03-10"));
        assert_eq!(window.start, NaiveDate::MAX);
        assert_eq!(window.end, NaiveDate::MAX);
    }

    #[test]
    fn test_date_in_range_is_inclusive() {
        let range = DateRange {
            start: day("2026-01-01"),
            end: day("2026-01-31"),
        };
        assert!(range.contains(day("2026-01-01")));
        assert!(range.contains(day("2026-01-31")));
        assert!(!range.contains(day("2026-02-01")));
    }
}
