//! Due dates are local wall-clock times with no zone attached, the same shape a
//! `datetime-local` form field produces.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DueDateError {
    #[error("Unrecognized due date '{0}'. Try YYYY-MM-DDTHH:MM or YYYY-MM-DD")]
    Unrecognized(String),
}

/// Kept at whole-second precision, which is exactly what [`fmt::Display`]
/// writes, so a stored value always reads back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate(NaiveDateTime);

impl DueDate {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at.with_nanosecond(0).unwrap_or(at))
    }

    pub fn at(&self) -> NaiveDateTime {
        self.0
    }

    /// Parse optional form input. Blank input means "no deadline".
    pub fn parse_input(raw: Option<&str>) -> Result<Option<Self>, DueDateError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }

    pub fn is_before(&self, now: NaiveDateTime) -> bool {
        self.0 < now
    }

    /// Human label relative to `now`: `Today, 09:30 AM`, `Tomorrow, 09:30 AM`
    /// or `Jan 5, 09:30 AM`. Only calendar dates are compared.
    pub fn label(&self, now: NaiveDateTime) -> String {
        let day = self.0.date();
        let today = now.date();
        let time = self.0.format("%I:%M %p");

        if day == today {
            format!("Today, {time}")
        } else if today.succ_opt() == Some(day) {
            format!("Tomorrow, {time}")
        } else {
            format!("{}, {time}", self.0.format("%b %-d"))
        }
    }
}

impl FromStr for DueDate {
    type Err = DueDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        for format in INPUT_FORMATS {
            if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::new(at));
            }
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::new(parsed.with_timezone(&Local).naive_local()));
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            if let Some(at) = date.and_hms_opt(0, 0, 0) {
                return Ok(Self::new(at));
            }
        }

        Err(DueDateError::Unrecognized(s.to_string()))
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.second() == 0 {
            write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M"))
        } else {
            write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
        }
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Header line for the current day, e.g. `Friday, October 16, 2026`.
pub fn day_heading(now: NaiveDateTime) -> String {
    now.format("%A, %B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").unwrap()
    }

    #[test]
    fn blank_input_maps_to_no_deadline() {
        assert_eq!(DueDate::parse_input(None), Ok(None));
        assert_eq!(DueDate::parse_input(Some("")), Ok(None));
        assert_eq!(DueDate::parse_input(Some("   ")), Ok(None));
    }

    #[test]
    fn parses_form_and_date_only_input() {
        let due = DueDate::parse_input(Some("2099-01-01T10:00")).unwrap().unwrap();
        assert_eq!(due.at(), at("2099-01-01T10:00"));

        let date_only: DueDate = "2025-01-05".parse().unwrap();
        assert_eq!(date_only.at(), at("2025-01-05T00:00"));

        let spaced: DueDate = "2025-01-05 18:45".parse().unwrap();
        assert_eq!(spaced.at(), at("2025-01-05T18:45"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            DueDate::parse_input(Some("next tuesday")),
            Err(DueDateError::Unrecognized("next tuesday".into()))
        );
    }

    #[test]
    fn display_keeps_minute_precision_unless_seconds_present() {
        let minute: DueDate = "2025-03-09T07:05".parse().unwrap();
        assert_eq!(minute.to_string(), "2025-03-09T07:05");

        let second: DueDate = "2025-03-09T07:05:30".parse().unwrap();
        assert_eq!(second.to_string(), "2025-03-09T07:05:30");
    }

    #[test]
    fn rfc3339_input_drops_subsecond_precision() {
        let due: DueDate = "2030-01-05T10:00:00.500Z".parse().unwrap();
        let expected = DateTime::parse_from_rfc3339("2030-01-05T10:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();

        assert_eq!(due.at(), expected);
        assert_eq!(due.at().nanosecond(), 0);
        assert_eq!(due.to_string().parse::<DueDate>().unwrap(), due);
    }

    #[test]
    fn new_truncates_to_whole_seconds() {
        let precise = at("2025-01-05T10:00")
            .with_second(7)
            .and_then(|t| t.with_nanosecond(250_000_000))
            .unwrap();
        let due = DueDate::new(precise);

        assert_eq!(due.to_string(), "2025-01-05T10:00:07");
        assert_eq!(due.to_string().parse::<DueDate>().unwrap(), due);
    }

    #[test]
    fn serializes_as_plain_string() {
        let due: DueDate = "2025-01-05T10:00".parse().unwrap();
        let json = serde_json::to_string(&due).unwrap();
        assert_eq!(json, "\"2025-01-05T10:00\"");
        let back: DueDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, due);
    }

    #[test]
    fn label_compares_calendar_days() {
        let now = at("2025-01-31T23:30");

        let later_today: DueDate = "2025-01-31T23:45".parse().unwrap();
        assert_eq!(later_today.label(now), "Today, 11:45 PM");

        let early_tomorrow: DueDate = "2025-02-01T00:15".parse().unwrap();
        assert_eq!(early_tomorrow.label(now), "Tomorrow, 12:15 AM");

        let further: DueDate = "2025-02-02T09:05".parse().unwrap();
        assert_eq!(further.label(now), "Feb 2, 09:05 AM");

        let yesterday: DueDate = "2025-01-30T14:00".parse().unwrap();
        assert_eq!(yesterday.label(now), "Jan 30, 02:00 PM");
    }

    #[test]
    fn heading_spells_out_the_day() {
        assert_eq!(day_heading(at("2026-10-16T08:00")), "Friday, October 16, 2026");
    }
}
