use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::WeekType;

/// Weekday names used as timetable keys, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// School days are the first entries of [`WEEKDAY_NAMES`].
pub const SCHOOL_DAYS: usize = 5;

/// One scheduled lesson slot.
///
/// Fields the portal does not model are kept in `extra` so that a proxied
/// timetable round-trips without losing upstream data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Period label, e.g. "3" or "RC"
    #[serde(default, deserialize_with = "label_from_string_or_number")]
    pub period: String,
    /// Display time, e.g. "9:05"
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub room: String,
    /// Rotation tag; absent means the period runs in both weeks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_type: Option<String>,
    /// A casual teacher is covering this period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_substitute: Option<bool>,
    /// The class has moved rooms for this period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_room_change: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Period {
    pub fn new(period: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn with_week_type(mut self, week_type: impl Into<String>) -> Self {
        self.week_type = Some(week_type.into());
        self
    }

    /// Whether this period runs in the given rotation.
    ///
    /// Untagged (or empty-tagged) periods run in both weeks.
    pub fn applies_to(&self, week_type: WeekType) -> bool {
        match self.week_type.as_deref() {
            None | Some("") => true,
            Some(tag) => week_type.matches(tag),
        }
    }
}

/// Ordered periods for one weekday.
pub type DayTimetable = Vec<Period>;

/// Weekday name ("Monday".."Friday") to that day's periods.
pub type WeekTimetable = BTreeMap<String, DayTimetable>;

fn label_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected period label, found {}",
            other
        ))),
    }
}
