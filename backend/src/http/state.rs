//! Application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::SelectionStore;
use crate::upstream::UpstreamApi;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// School information system client
    pub upstream: Arc<dyn UpstreamApi>,
    /// Per-session rotation memory
    pub selections: SelectionStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new application state with an empty selection store sized
    /// from `config.sessions`.
    pub fn new(upstream: Arc<dyn UpstreamApi>, config: AppConfig) -> Self {
        let selections = SelectionStore::with_limits(
            config.sessions.max_sessions,
            Duration::from_secs(config.sessions.idle_ttl_secs),
        );
        Self {
            upstream,
            selections,
            config: Arc::new(config),
        }
    }
}
