//! Timetable refresh pipeline.
//!
//! Combines rotation inference, sticky selection and per-day filtering
//! into the single step a page refresh performs.

use serde::{Deserialize, Serialize};

use super::filter::{apply_filter, resolve_day_key};
use super::selection::{select_week_type, SelectionMemory, SelectionSource};
use super::week_type::resolve_week_type;
use crate::models::{TimetablePayload, WeekTimetable, WeekType};

/// What a refresh produced for the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// Week timetable with today's periods narrowed to the active rotation
    pub timetable: WeekTimetable,
    pub week_type: WeekType,
    pub source: SelectionSource,
    /// Weekday that was filtered, when one could be resolved
    pub day: Option<String>,
}

/// Run one refresh over an already-fetched payload.
///
/// `current` is an explicit user override. The payload is left untouched;
/// the returned memory replaces the caller's previous value.
pub fn refresh(
    payload: &TimetablePayload,
    current: Option<WeekType>,
    memory: SelectionMemory,
) -> (RefreshOutcome, SelectionMemory) {
    let day_meta = payload.day();
    let external = resolve_week_type(day_meta);
    let (selection, memory) = select_week_type(current, external, memory);
    let day = resolve_day_key(day_meta);
    let timetable = apply_filter(&payload.timetable, selection.week_type, day.as_deref());

    (
        RefreshOutcome {
            timetable,
            week_type: selection.week_type,
            source: selection.source,
            day,
        },
        memory,
    )
}
