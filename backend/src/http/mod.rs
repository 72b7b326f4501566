//! HTTP server module for the portal backend.
//!
//! Exposes the timetable pipeline and the proxied SBHS data as a small REST
//! API, and runs the OAuth login / refresh / logout flow with tokens held
//! in `HttpOnly` cookies.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Cookies, OAuth redirects, token refresh                │
//! │  - JSON serialization, CORS, compression, error mapping   │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Service Layer (services/)                                │
//! │  - Week-type inference, sticky selection, filtering       │
//! │  - Per-session selection memory                           │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Upstream Layer (upstream/)                               │
//! │  - SbhsClient / LocalUpstream                             │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
