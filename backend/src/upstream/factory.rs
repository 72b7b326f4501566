//! Upstream factory for dependency injection.
//!
//! Chooses the upstream implementation from configuration so the HTTP
//! layer only ever sees `Arc<dyn UpstreamApi>`.

use std::str::FromStr;
use std::sync::Arc;

use super::error::{UpstreamError, UpstreamResult};
use super::local::LocalUpstream;
#[cfg(feature = "http-server")]
use super::sbhs::SbhsClient;
use super::UpstreamApi;
use crate::config::AppConfig;

/// Upstream implementation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// The real SBHS API over HTTPS
    Sbhs,
    /// Fixture-backed in-memory upstream
    Local,
}

impl FromStr for UpstreamKind {
    type Err = String;

    /// Parse upstream kind from string ("sbhs", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sbhs" | "remote" => Ok(Self::Sbhs),
            "local" | "fixture" => Ok(Self::Local),
            _ => Err(format!("Unknown upstream kind: {}", s)),
        }
    }
}

/// Builds upstream instances from configuration.
pub struct UpstreamFactory;

impl UpstreamFactory {
    /// Create the upstream named by `config.upstream.kind`.
    ///
    /// The local upstream loads `config.upstream.fixture_path` when set and
    /// starts empty otherwise.
    pub fn create(config: &AppConfig) -> UpstreamResult<Arc<dyn UpstreamApi>> {
        let kind = config
            .upstream_kind()
            .map_err(|e| UpstreamError::Configuration(e.to_string()))?;

        match kind {
            UpstreamKind::Sbhs => {
                #[cfg(feature = "http-server")]
                {
                    let client = SbhsClient::new(&config.upstream, &config.oauth)?;
                    Ok(Arc::new(client) as Arc<dyn UpstreamApi>)
                }
                #[cfg(not(feature = "http-server"))]
                {
                    Err(UpstreamError::Configuration(
                        "SBHS upstream requires the http-server feature".to_string(),
                    ))
                }
            }
            UpstreamKind::Local => Ok(Arc::new(Self::create_local(config)?) as Arc<dyn UpstreamApi>),
        }
    }

    /// Create a local upstream, loading the configured fixture if any.
    pub fn create_local(config: &AppConfig) -> UpstreamResult<LocalUpstream> {
        match config.upstream.fixture_path {
            Some(ref path) => LocalUpstream::from_fixture_file(path),
            None => Ok(LocalUpstream::new()),
        }
    }
}
