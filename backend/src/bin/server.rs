//! Portal HTTP Server Binary
//!
//! Loads configuration, builds the upstream client and serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! # Against the real SBHS API
//! SBHS_CLIENT_ID=... SBHS_CLIENT_SECRET=... cargo run --bin portal-server
//!
//! # Against a local fixture
//! SBHS_UPSTREAM=local SBHS_FIXTURE=fixtures/local.json cargo run --bin portal-server
//! ```
//!
//! # Environment Variables
//!
//! - `PORTAL_CONFIG`: Path to a TOML config file (default: `portal.toml` if present)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log filter (default: info)
//!
//! See [`sbhs_portal::config`] for the remaining overrides.

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sbhs_portal::config::AppConfig;
use sbhs_portal::http::{create_router, AppState};
use sbhs_portal::upstream::UpstreamFactory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting portal server");

    let config = AppConfig::load()?;
    let upstream = UpstreamFactory::create(&config)?;
    info!("Upstream '{}' initialized", upstream.name());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(upstream, config);
    let app = create_router(state);

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
