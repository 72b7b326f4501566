use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::WeekTimetable;

/// Loosely-typed description of "today" as reported by SBHS.
///
/// No schema is guaranteed: fields may be missing, misnamed or oddly cased,
/// so lookups go through ordered candidate lists rather than struct fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpstreamDayMetadata(Map<String, Value>);

impl UpstreamDayMetadata {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build metadata from string pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Field value, treating JSON `null` as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// First present field among `candidates`, in order.
    pub fn first_present<'a>(&'a self, candidates: &[&'a str]) -> Option<(&'a str, &'a Value)> {
        candidates
            .iter()
            .find_map(|&field| self.get(field).map(|v| (field, v)))
    }
}

/// Wrapper around the upstream's own view of the current day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamEnvelope {
    #[serde(default)]
    pub day: Option<UpstreamDayMetadata>,
}

/// Timetable payload as supplied by the upstream fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetablePayload {
    #[serde(default)]
    pub timetable: WeekTimetable,
    #[serde(default)]
    pub upstream: UpstreamEnvelope,
}

impl TimetablePayload {
    /// Day metadata, if the upstream sent any.
    pub fn day(&self) -> Option<&UpstreamDayMetadata> {
        self.upstream.day.as_ref()
    }
}
