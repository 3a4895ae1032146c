// src/domain/dates.rs

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

const FULL_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%B %d %Y",
    "%B %d, %Y",
];

// Tried after appending the current year, for "5 June" style text.
const YEARLESS_FORMATS: &[&str] = &["%d %B %Y", "%B %d %Y"];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "mon", "tue",
    "tues", "wed", "thu", "thurs", "fri", "sat", "sun",
];

fn ordinal_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid regex"))
}

/// Best-effort reading of the free-text dates listing sites show
/// ("Today", "Now", "5th June 2024", "Monday, 3 June", "03/06/2024").
/// Returns `None` when nothing matches.
pub fn parse_natural_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    match lowered.as_str() {
        "today" | "now" | "immediately" | "available now" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    let cleaned = ordinal_suffix().replace_all(&lowered, "$1");
    let cleaned = strip_weekday(&cleaned);
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for fmt in FULL_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(date);
        }
    }

    let with_year = format!("{} {}", cleaned.trim_end_matches(','), today.year());
    YEARLESS_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())
}

fn strip_weekday(text: &str) -> &str {
    let first = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .next()
        .unwrap_or("");
    if WEEKDAYS.contains(&first) {
        text[first.len()..].trim_start_matches(|c: char| c == ',' || c.is_whitespace())
    } else {
        text
    }
}
