#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;

use sbhs_portal::models::TimetablePayload;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment, since tests in one binary run in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Monday has one untagged, one week-A and one week-B period; Tuesday has
/// one of each rotation.
pub fn sample_timetable() -> Value {
    json!({
        "Monday": [
            {"period": "1", "time": "9:05", "subject": "English", "teacher": "Ms Park", "room": "101"},
            {"period": "2", "time": "10:10", "subject": "Maths", "teacher": "Mr Chen", "room": "204", "weekType": "A"},
            {"period": "3", "time": "11:30", "subject": "Science", "teacher": "Dr Roy", "room": "L2", "weekType": "B"}
        ],
        "Tuesday": [
            {"period": "1", "subject": "History", "weekType": "A"},
            {"period": "2", "subject": "Music", "weekType": "B"}
        ]
    })
}

/// Payload with the sample timetable and the given upstream day metadata.
pub fn sample_payload(day: Value) -> TimetablePayload {
    serde_json::from_value(json!({
        "timetable": sample_timetable(),
        "upstream": {"day": day}
    }))
    .expect("sample payload is valid")
}

/// Period labels for one weekday of a serialized timetable.
pub fn period_labels(timetable: &Value, day: &str) -> Vec<String> {
    timetable[day]
        .as_array()
        .map(|periods| {
            periods
                .iter()
                .filter_map(|p| p["period"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
