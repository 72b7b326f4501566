//! Portal configuration.
//!
//! Settings are read from a TOML file and then overridden by environment
//! variables. Every section has defaults, so a missing file is not an
//! error.
//!
//! # File lookup
//! 1. The path in `PORTAL_CONFIG`, if set (must exist)
//! 2. `portal.toml`, `backend/portal.toml`, `../portal.toml`
//!
//! # Environment overrides
//! - `HOST`, `PORT`: bind address
//! - `SBHS_UPSTREAM`: `sbhs` | `local`
//! - `SBHS_BASE_URL`: upstream API root
//! - `SBHS_FIXTURE`: fixture file for the local upstream
//! - `SBHS_CLIENT_ID`, `SBHS_CLIENT_SECRET`, `SBHS_REDIRECT_URI`: OAuth client
//! - `COOKIE_SECURE`: `true` | `false`

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::upstream::UpstreamKind;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub oauth: OAuthSettings,
    #[serde(default)]
    pub cookies: CookieSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where timetable, notice and user data come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// `sbhs` or `local`
    #[serde(default = "default_upstream_kind")]
    pub kind: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timetable_path")]
    pub timetable_path: String,
    #[serde(default = "default_notices_path")]
    pub notices_path: String,
    #[serde(default = "default_userinfo_path")]
    pub userinfo_path: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts for a data fetch that failed with a 5xx or a
    /// transport error
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Delay before each extra attempt, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// JSON fixture served by the local upstream
    #[serde(default)]
    pub fixture_path: Option<String>,
}

/// OAuth client registration with the school's auth server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

/// Token cookie attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    #[serde(default = "default_true")]
    pub secure: bool,
    /// Lifetime of the refresh-token cookie in seconds
    #[serde(default = "default_refresh_max_age")]
    pub refresh_max_age_secs: u64,
}

/// Limits on the per-session rotation memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Sessions kept before the least recently used is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Sessions unused for this long are forgotten
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_upstream_kind() -> String {
    "sbhs".to_string()
}

fn default_base_url() -> String {
    "https://student.sbhs.net.au".to_string()
}

fn default_timetable_path() -> String {
    "/api/timetable/timetable.json".to_string()
}

fn default_notices_path() -> String {
    "/api/dailynews/list.json".to_string()
}

fn default_userinfo_path() -> String {
    "/api/details/userinfo.json".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_idle_ttl_secs() -> u64 {
    14 * 24 * 60 * 60
}

fn default_authorize_url() -> String {
    "https://student.sbhs.net.au/api/authorize".to_string()
}

fn default_token_url() -> String {
    "https://student.sbhs.net.au/api/token".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/api/auth/callback".to_string()
}

fn default_scope() -> String {
    "all-ro".to_string()
}

fn default_true() -> bool {
    true
}

fn default_refresh_max_age() -> u64 {
    90 * 24 * 60 * 60
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            kind: default_upstream_kind(),
            base_url: default_base_url(),
            timetable_path: default_timetable_path(),
            notices_path: default_notices_path(),
            userinfo_path: default_userinfo_path(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            fixture_path: None,
        }
    }
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: default_true(),
            refresh_max_age_secs: default_refresh_max_age(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from the configured or default file location, then apply
    /// environment overrides.
    pub fn load() -> ConfigResult<Self> {
        let mut config = match env::var("PORTAL_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::from_default_location()?,
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Read the first config file found in the standard locations, or
    /// defaults when there is none.
    pub fn from_default_location() -> ConfigResult<Self> {
        let search_paths = [
            PathBuf::from("portal.toml"),
            PathBuf::from("backend/portal.toml"),
            PathBuf::from("../portal.toml"),
        ];

        match search_paths.iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(path),
            None => {
                log::info!("No portal.toml found, using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Override settings from environment variables.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{}' is not a valid port number", port),
            })?;
        }
        if let Ok(kind) = env::var("SBHS_UPSTREAM") {
            self.upstream.kind = kind;
        }
        if let Ok(base_url) = env::var("SBHS_BASE_URL") {
            self.upstream.base_url = base_url;
        }
        if let Ok(fixture) = env::var("SBHS_FIXTURE") {
            self.upstream.fixture_path = Some(fixture);
        }
        if let Ok(client_id) = env::var("SBHS_CLIENT_ID") {
            self.oauth.client_id = client_id;
        }
        if let Ok(secret) = env::var("SBHS_CLIENT_SECRET") {
            self.oauth.client_secret = secret;
        }
        if let Ok(redirect) = env::var("SBHS_REDIRECT_URI") {
            self.oauth.redirect_uri = redirect;
        }
        if let Ok(secure) = env::var("COOKIE_SECURE") {
            self.cookies.secure = secure.parse().map_err(|_| ConfigError::InvalidValue {
                key: "COOKIE_SECURE".to_string(),
                message: format!("'{}' is not true or false", secure),
            })?;
        }

        // Fail early on a kind the factory cannot build.
        self.upstream_kind()?;
        Ok(())
    }

    /// Parsed upstream kind.
    pub fn upstream_kind(&self) -> ConfigResult<UpstreamKind> {
        self.upstream
            .kind
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                key: "upstream.kind".to_string(),
                message,
            })
    }
}
