//! Week-type (A/B rotation) inference from upstream day metadata.
//!
//! SBHS reports the rotation in whichever field the current API revision
//! happens to use, or only as a suffix of the day name ("Monday B",
//! "MonA"). Resolution tries an explicit rotation field first and then
//! falls back to the day name. Nothing here fails: unusable input simply
//! yields `None`.

use log::debug;
use serde_json::Value;

use crate::models::{UpstreamDayMetadata, WeekType};

/// Rotation fields, in lookup order.
pub const WEEK_TYPE_FIELDS: [&str; 6] = ["weekType", "week_type", "week", "weekLabel", "rotation", "cycle"];

/// Day-name fields, in lookup order.
pub const DAY_NAME_FIELDS: [&str; 4] = ["dayName", "dayname", "day", "title"];

/// Infer the rotation letter for a day.
///
/// Only the first present rotation field is considered. If it does not
/// normalize to exactly `A` or `B`, the day name is inspected for a
/// trailing rotation letter instead.
pub fn resolve_week_type(meta: Option<&UpstreamDayMetadata>) -> Option<WeekType> {
    let meta = meta?;

    if let Some((field, value)) = meta.first_present(&WEEK_TYPE_FIELDS) {
        if let Some(week_type) = scalar_text(value).and_then(|s| s.parse::<WeekType>().ok()) {
            debug!("week type {} from field '{}'", week_type, field);
            return Some(week_type);
        }
        debug!("field '{}' present but not a rotation letter: {}", field, value);
    }

    let (field, value) = meta.first_present(&DAY_NAME_FIELDS)?;
    let week_type = scalar_text(value).and_then(|name| trailing_letter(&name))?;
    debug!("week type {} from day name field '{}'", week_type, field);
    Some(week_type)
}

/// Text form of a scalar JSON value. Arrays and objects carry no signal.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Rotation letter at the very end of a trimmed day name ("Monday B", "MondayA").
fn trailing_letter(name: &str) -> Option<WeekType> {
    name.trim().chars().last().and_then(WeekType::from_letter)
}
