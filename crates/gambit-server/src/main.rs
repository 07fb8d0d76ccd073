//! Gambit server entry point.
//!
//! Loads configuration from the environment, connects the session store,
//! builds the engine client and serves the REST API and suggestion hub.
//!
//! ```text
//! GambitConfig::from_env --> SessionBackend + EngineBackend --> AppState --> axum
//! ```

use std::sync::Arc;

use anyhow::Context;
use gambit_core::{EngineBackend, HttpEngineClient, StubEngine};
use gambit_db::SessionBackend;
use gambit_server::{AppState, EngineTarget, GambitConfig, LogFormat, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, store connection or serving fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GambitConfig::from_env().context("loading configuration")?;

    // Initialize structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    info!("gambit-server starting");
    info!(
        host = config.server.host,
        port = config.server.port,
        store = if config.redis_url.is_some() { "dragonfly" } else { "memory" },
        engine_timeout_ms = config.analysis.engine_timeout.as_millis(),
        session_ttl_secs = config.store.ttl.as_secs(),
        missing_session = ?config.analysis.missing_session,
        "configuration loaded"
    );

    let sessions = SessionBackend::from_url(config.redis_url.as_deref(), config.store)
        .await
        .context("connecting session store")?;

    let engine = match &config.engine {
        EngineTarget::Http(url) => {
            info!(engine_url = %url, "engine client configured");
            EngineBackend::Http(
                HttpEngineClient::new(url, config.analysis.engine_timeout)
                    .context("building engine client")?,
            )
        }
        EngineTarget::Stub => {
            info!("stub engine configured, suggestions are canned");
            EngineBackend::Stub(StubEngine::new())
        }
    };

    let state = Arc::new(AppState::new(sessions, engine, config.analysis));
    start_server(&config.server, state)
        .await
        .context("serving")?;

    info!("gambit-server stopped");
    Ok(())
}
