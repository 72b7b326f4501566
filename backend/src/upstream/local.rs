//! In-memory upstream for local development and tests.
//!
//! Serves a fixed fixture and issues its own opaque tokens. Tokens are only
//! accepted if this instance issued (or was told about) them, so the auth
//! flow can be exercised end to end without SBHS.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::error::{ErrorContext, UpstreamError, UpstreamResult};
use super::{TokenSet, UpstreamApi};
use crate::models::TimetablePayload;

/// Data served by [`LocalUpstream`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalFixture {
    #[serde(default)]
    pub timetable: TimetablePayload,
    #[serde(default)]
    pub notices: Value,
    #[serde(default)]
    pub userinfo: Value,
}

#[derive(Default)]
struct LocalState {
    fixture: LocalFixture,
    access_tokens: HashSet<String>,
    refresh_tokens: HashSet<String>,
}

/// Fixture-backed upstream.
#[derive(Clone, Default)]
pub struct LocalUpstream {
    state: Arc<RwLock<LocalState>>,
    issued: Arc<AtomicU64>,
}

impl LocalUpstream {
    /// Empty upstream with no accepted tokens.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture(fixture: LocalFixture) -> Self {
        let upstream = Self::new();
        upstream.state.write().fixture = fixture;
        upstream
    }

    /// Load a JSON fixture file.
    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> UpstreamResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            UpstreamError::Configuration(format!(
                "Failed to read fixture {}: {}",
                path.display(),
                e
            ))
        })?;
        let fixture: LocalFixture = serde_json::from_str(&content).map_err(|e| {
            UpstreamError::Configuration(format!(
                "Failed to parse fixture {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::with_fixture(fixture))
    }

    /// Replace the timetable served from now on.
    pub fn set_timetable(&self, timetable: TimetablePayload) {
        self.state.write().fixture.timetable = timetable;
    }

    /// Accept an access token that was not issued by this instance.
    pub fn allow_access_token(&self, token: impl Into<String>) {
        self.state.write().access_tokens.insert(token.into());
    }

    /// Accept a refresh token that was not issued by this instance.
    pub fn allow_refresh_token(&self, token: impl Into<String>) {
        self.state.write().refresh_tokens.insert(token.into());
    }

    /// Invalidate an access token, as if it had expired.
    pub fn revoke_access_token(&self, token: &str) {
        self.state.write().access_tokens.remove(token);
    }

    fn issue_tokens(&self) -> TokenSet {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let tokens = TokenSet {
            access_token: format!("local-access-{}", n),
            refresh_token: Some(format!("local-refresh-{}", n)),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        };

        let mut state = self.state.write();
        state.access_tokens.insert(tokens.access_token.clone());
        if let Some(ref refresh) = tokens.refresh_token {
            state.refresh_tokens.insert(refresh.clone());
        }
        tokens
    }

    fn authorize(&self, operation: &str, access_token: &str) -> UpstreamResult<()> {
        if self.state.read().access_tokens.contains(access_token) {
            Ok(())
        } else {
            Err(UpstreamError::unauthorized(
                "unknown access token",
                ErrorContext::new(operation),
            ))
        }
    }
}

#[async_trait]
impl UpstreamApi for LocalUpstream {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn health_check(&self) -> UpstreamResult<bool> {
        Ok(true)
    }

    async fn fetch_timetable(&self, access_token: &str) -> UpstreamResult<TimetablePayload> {
        self.authorize("fetch_timetable", access_token)?;
        Ok(self.state.read().fixture.timetable.clone())
    }

    async fn fetch_notices(&self, access_token: &str) -> UpstreamResult<Value> {
        self.authorize("fetch_notices", access_token)?;
        Ok(self.state.read().fixture.notices.clone())
    }

    async fn fetch_userinfo(&self, access_token: &str) -> UpstreamResult<Value> {
        self.authorize("fetch_userinfo", access_token)?;
        Ok(self.state.read().fixture.userinfo.clone())
    }

    async fn exchange_code(&self, code: &str) -> UpstreamResult<TokenSet> {
        if code.trim().is_empty() {
            return Err(UpstreamError::status(
                400,
                "invalid_grant",
                ErrorContext::new("exchange_code"),
            ));
        }
        Ok(self.issue_tokens())
    }

    async fn refresh_token(&self, refresh_token: &str) -> UpstreamResult<TokenSet> {
        let known = self.state.write().refresh_tokens.remove(refresh_token);
        if !known {
            return Err(UpstreamError::unauthorized(
                "unknown refresh token",
                ErrorContext::new("refresh_token"),
            ));
        }
        Ok(self.issue_tokens())
    }
}
