//! Enumerations and field types shared by the record types.
//!
//! This module defines the structured values used to classify and order
//! records (priorities and sort keys) together with the date helpers used
//! when reading due dates from forms, fixture files and remote rows.

use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task importance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl Priority {
    /// Position in severity order: high first, low last.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Available orderings for the task list.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum TaskSort {
    /// Most recently added first.
    #[default]
    CreatedAt,
    /// Soonest due first, undated tasks last.
    DueDate,
    /// High, medium, then low.
    Priority,
    /// Alphabetical by title.
    Title,
}

/// Available orderings for the client and project directories.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum DirectorySort {
    /// Newest first.
    #[default]
    CreatedAt,
    /// Alphabetical by name.
    Name,
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "this friday", bare weekday names
/// - "end of week", "end of month", "weekend"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" or a full RFC 3339 timestamp
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_input_from(s, Local::now().date_naive())
}

/// Same as [`parse_due_input`] with an explicit reference day.
pub fn parse_due_input_from(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(days_until_saturday as i64));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let count = |suffix: char| rest.strip_suffix(suffix).and_then(|n| n.trim().parse::<i64>().ok());
        // Out-of-range offsets are unrecognised input, not a crash.
        let offset = if let Some(n) = count('d') {
            Some(Duration::try_days(n))
        } else if let Some(n) = count('w') {
            Some(Duration::try_weeks(n))
        } else {
            // Approximate: 30 days per month
            count('m').map(|n| n.checked_mul(30).and_then(Duration::try_days))
        };
        if let Some(offset) = offset {
            return offset.and_then(|d| today.checked_add_signed(d));
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];

    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {}", day_name) {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {}", day_name) {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add));
        }
    }

    parse_date_lenient(&s)
}

/// Parse a stored date: `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Start and end of the ISO week (Monday to Sunday) containing `today`.
pub fn start_end_of_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {}d", n),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Serde adapter for optional due dates that tolerates both date and timestamp strings.
pub mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_date_lenient(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'"))),
        }
    }
}
