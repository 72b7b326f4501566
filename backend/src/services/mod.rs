//! Timetable business logic.
//!
//! Pure functions over already-fetched data: rotation inference
//! ([`week_type`]), sticky selection ([`selection`]), per-day filtering
//! ([`filter`]) and the refresh pipeline that chains them ([`timetable`]).
//! [`selection_store`] keeps per-session memory for the HTTP server.

pub mod filter;
pub mod selection;
pub mod selection_store;
pub mod timetable;
pub mod week_type;


pub use filter::{apply_filter, filter_day, resolve_day_key};
pub use selection::{select_week_type, Selection, SelectionMemory, SelectionSource, DEFAULT_WEEK_TYPE};
pub use selection_store::SelectionStore;
pub use timetable::{refresh, RefreshOutcome};
pub use week_type::resolve_week_type;
