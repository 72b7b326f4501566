//! Data Transfer Objects for the HTTP API.
//!
//! The timetable response itself is [`RefreshOutcome`], re-exported here.

use serde::{Deserialize, Serialize};

pub use crate::services::RefreshOutcome;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Upstream name and reachability, e.g. "sbhs: reachable"
    pub upstream: String,
}

/// Query parameters for the timetable endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimetableQuery {
    /// Explicit rotation override ("A" or "B"); other values are ignored
    #[serde(default)]
    pub week: Option<String>,
}

/// Query parameters on the OAuth redirect back to the portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Set by the auth server when the user denied access
    #[serde(default)]
    pub error: Option<String>,
}

/// Response for a successful token refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub ok: bool,
    /// Seconds until the new access token expires
    pub expires_in: u64,
}

/// Response for logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub ok: bool,
}
