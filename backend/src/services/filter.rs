//! Per-day rotation filtering of a week timetable.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use log::debug;

use super::week_type::{scalar_text, DAY_NAME_FIELDS};
use crate::models::{DayTimetable, UpstreamDayMetadata, WeekTimetable, WeekType, SCHOOL_DAYS, WEEKDAY_NAMES};

/// Date field consulted before any day-name matching.
pub const DATE_FIELD: &str = "date";

/// Length of the lower-case prefix of a weekday name matched inside a day name.
const DAY_FRAGMENT_LEN: usize = 3;

/// Offset-less datetime layouts accepted in the date field.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Weekday name ("Monday".."Sunday") the metadata describes.
///
/// A parseable `date` field wins. Otherwise the first present day-name
/// field is searched for a weekday fragment, which only ever yields
/// Monday through Friday.
pub fn resolve_day_key(meta: Option<&UpstreamDayMetadata>) -> Option<String> {
    let meta = meta?;

    if let Some(weekday) = meta
        .get(DATE_FIELD)
        .and_then(scalar_text)
        .and_then(|s| parse_weekday(&s))
    {
        return Some(weekday_name(weekday).to_string());
    }

    let (_, value) = meta.first_present(&DAY_NAME_FIELDS)?;
    let name = scalar_text(value)?.to_lowercase();
    WEEKDAY_NAMES[..SCHOOL_DAYS]
        .iter()
        .find(|day| name.contains(&day[..DAY_FRAGMENT_LEN].to_lowercase()))
        .map(|day| day.to_string())
}

/// Periods of `day` that run in `week_type`, as a new list.
pub fn filter_day(day: &DayTimetable, week_type: WeekType) -> DayTimetable {
    day.iter()
        .filter(|period| period.applies_to(week_type))
        .cloned()
        .collect()
}

/// Copy of `week` with only the `day_key` entry filtered to `week_type`.
///
/// Every other weekday passes through untouched. A missing key, or a key
/// the timetable has no entry for, returns an unfiltered copy.
pub fn apply_filter(week: &WeekTimetable, week_type: WeekType, day_key: Option<&str>) -> WeekTimetable {
    let mut filtered = week.clone();

    let Some(key) = day_key else {
        return filtered;
    };

    match filtered.get_mut(key) {
        Some(periods) => {
            let before = periods.len();
            *periods = filter_day(periods, week_type);
            debug!(
                "filtered {} to week {}: kept {} of {} periods",
                key,
                week_type,
                periods.len(),
                before
            );
        }
        None => debug!("no timetable entry for {}, leaving week unfiltered", key),
    }

    filtered
}

fn parse_weekday(raw: &str) -> Option<Weekday> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.weekday());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive().weekday());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.weekday())
}

fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}
