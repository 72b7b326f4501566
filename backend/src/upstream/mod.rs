//! Upstream school information system access.
//!
//! The portal never owns timetable, notice or user data; it fetches them
//! from SBHS on each request through the [`UpstreamApi`] trait. Two
//! implementations exist:
//! - `sbhs::SbhsClient`: the real HTTPS API (requires `http-server`)
//! - [`LocalUpstream`]: an in-memory stand-in for development and tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::TimetablePayload;

pub mod error;
pub mod factory;
pub mod local;
#[cfg(feature = "http-server")]
pub mod sbhs;

pub use error::{ErrorContext, UpstreamError, UpstreamResult};
pub use factory::{UpstreamFactory, UpstreamKind};
pub use local::{LocalFixture, LocalUpstream};
#[cfg(feature = "http-server")]
pub use sbhs::SbhsClient;

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    /// Some servers omit this on refresh; keep the old one in that case
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_expires_in() -> u64 {
    3600
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Operations the portal needs from the school information system.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one instance is shared by all
/// request handlers.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Check that the upstream is reachable.
    async fn health_check(&self) -> UpstreamResult<bool>;

    /// Week timetable plus the upstream's metadata for today.
    async fn fetch_timetable(&self, access_token: &str) -> UpstreamResult<TimetablePayload>;

    /// Daily notices, passed through as-is.
    async fn fetch_notices(&self, access_token: &str) -> UpstreamResult<Value>;

    /// Portal details for the signed-in student, passed through as-is.
    async fn fetch_userinfo(&self, access_token: &str) -> UpstreamResult<Value>;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> UpstreamResult<TokenSet>;

    /// Obtain fresh tokens from a refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> UpstreamResult<TokenSet>;
}
