//! Server configuration loaded from environment variables.
//!
//! Every variable has a default so a bare `gambit-server` starts against
//! the in-memory store and a local engine.

use std::time::Duration;

use gambit_core::{AnalysisConfig, MissingSessionPolicy};
use gambit_db::StoreConfig;

use crate::server::ServerConfig;

/// `ENGINE_URL` value that selects the built-in stub engine.
pub const STUB_ENGINE: &str = "stub";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Parse failure.
        reason: String,
    },
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, for terminals.
    #[default]
    Pretty,
    /// One JSON object per line, for collectors.
    Json,
}

/// Where evaluations come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineTarget {
    /// The engine HTTP service at this base URL.
    Http(String),
    /// The canned stub, no network.
    Stub,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct GambitConfig {
    /// Bind address.
    pub server: ServerConfig,
    /// Session store URL. `None` selects the in-memory store.
    pub redis_url: Option<String>,
    /// Engine selection.
    pub engine: EngineTarget,
    /// Session expiry settings.
    pub store: StoreConfig,
    /// Orchestration settings.
    pub analysis: AnalysisConfig,
    /// Log rendering.
    pub log_format: LogFormat,
}

impl GambitConfig {
    /// Load configuration from the process environment.
    ///
    /// Optional variables:
    /// - `GAMBIT_HOST` -- bind host (default `0.0.0.0`)
    /// - `GAMBIT_PORT` -- bind port (default `8080`)
    /// - `REDIS_URL` -- session store URL (unset: in-memory store)
    /// - `ENGINE_URL` -- engine base URL, or `stub` (default `http://localhost:8001`)
    /// - `ENGINE_TIMEOUT_SECS` -- engine call bound (default `30`)
    /// - `SESSION_TTL_SECS` -- sliding session expiry (default `21600`)
    /// - `REFRESH_INDEX_ON_UPDATE` -- refresh the username index on update (default `true`)
    /// - `MISSING_SESSION_POLICY` -- `tolerate` or `abort` (default `tolerate`)
    /// - `LOG_FORMAT` -- `pretty` or `json` (default `pretty`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let host = var("GAMBIT_HOST", "0.0.0.0");
        let port: u16 = var("GAMBIT_PORT", "8080")
            .trim()
            .parse()
            .map_err(|e| invalid("GAMBIT_PORT", &e))?;

        let redis_url = lookup("REDIS_URL").filter(|v| !v.trim().is_empty());

        let engine_url = var("ENGINE_URL", "http://localhost:8001");
        let engine = if engine_url.trim().eq_ignore_ascii_case(STUB_ENGINE) {
            EngineTarget::Stub
        } else {
            EngineTarget::Http(engine_url)
        };

        let engine_timeout_secs: u64 = var("ENGINE_TIMEOUT_SECS", "30")
            .trim()
            .parse()
            .map_err(|e| invalid("ENGINE_TIMEOUT_SECS", &e))?;

        let session_ttl_secs: u64 = var("SESSION_TTL_SECS", "21600")
            .trim()
            .parse()
            .map_err(|e| invalid("SESSION_TTL_SECS", &e))?;
        if session_ttl_secs == 0 {
            return Err(invalid("SESSION_TTL_SECS", &"must be positive"));
        }

        let refresh_index_on_update: bool = var("REFRESH_INDEX_ON_UPDATE", "true")
            .trim()
            .parse()
            .map_err(|e| invalid("REFRESH_INDEX_ON_UPDATE", &e))?;

        let missing_session: MissingSessionPolicy = var("MISSING_SESSION_POLICY", "tolerate")
            .parse()
            .map_err(|e| invalid("MISSING_SESSION_POLICY", &e))?;

        let log_format = match var("LOG_FORMAT", "pretty").trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => return Err(invalid("LOG_FORMAT", &format_args!("unknown format {other}"))),
        };

        Ok(Self {
            server: ServerConfig { host, port },
            redis_url,
            engine,
            store: StoreConfig {
                ttl: Duration::from_secs(session_ttl_secs),
                refresh_index_on_update,
            },
            analysis: AnalysisConfig {
                engine_timeout: Duration::from_secs(engine_timeout_secs),
                missing_session,
            },
            log_format,
        })
    }
}

fn invalid(name: &'static str, reason: &dyn std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}
