//! Portal domain models.
//!
//! Plain data shared by the timetable services, the upstream client and the
//! HTTP layer. Nothing here performs I/O.

pub mod timetable;
pub mod upstream;
pub mod week_type;

pub use timetable::*;
pub use upstream::*;
pub use week_type::*;
