//! # SBHS Portal Backend
//!
//! Student portal backend for a school timetable, notices and portal data.
//!
//! The portal proxies timetable, notice and user data from the school's
//! information system (SBHS) and adds one piece of real logic on top:
//! working out whether today is an "A" or "B" week of the two-week bell
//! rotation, remembering that choice across refreshes when SBHS goes
//! quiet, and trimming today's periods to the active rotation.
//!
//! ## Architecture
//!
//! - [`models`]: Periods, week timetables, upstream day metadata, `WeekType`
//! - [`services`]: Pure rotation inference, selection and filtering
//! - [`upstream`]: `UpstreamApi` trait with SBHS and local implementations
//! - [`config`]: TOML + environment configuration
//! - [`http`]: Axum-based REST API and OAuth cookie flow (`http-server` feature)

pub mod config;
pub mod models;
pub mod services;
pub mod upstream;

#[cfg(feature = "http-server")]
pub mod http;
