//! User-facing watcher settings.
//!
//! Stored by the host as a JSON object with `camelCase` keys; any key that
//! is missing takes its default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::watcher::MIN_POLL_INTERVAL;

/// Default board poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Settings the watcher runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatcherSettings {
    /// Base URL of the session API.
    pub api_base_url: String,
    /// Master switch.
    pub enabled: bool,
    /// Player whose board is watched.
    pub username: String,
    /// Search depth asked of the engine for stand-alone analysis.
    pub analysis_depth: u32,
    /// Alternative moves asked of the engine for stand-alone analysis.
    pub top_moves_count: u32,
    /// Timer trigger period, in milliseconds on the wire. Values below
    /// [`MIN_POLL_INTERVAL`] are raised to it when parsed.
    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            api_base_url: String::from("http://localhost:8080"),
            enabled: true,
            username: String::new(),
            analysis_depth: 20,
            top_moves_count: 3,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WatcherSettings {
    /// Parse stored settings.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Whether there is enough to open a session.
    pub fn is_ready(&self) -> bool {
        self.enabled && !self.username.trim().is_empty()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer)
            .map(|ms| Duration::from_millis(ms).max(super::MIN_POLL_INTERVAL))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let settings = WatcherSettings::from_json(r#"{"username": "alice"}"#).unwrap();
        assert_eq!(settings.username, "alice");
        assert_eq!(settings.analysis_depth, 20);
        assert_eq!(settings.top_moves_count, 3);
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(settings.is_ready());
    }

    #[test]
    fn poll_interval_is_millis_on_the_wire() {
        let settings = WatcherSettings::from_json(r#"{"pollInterval": 250}"#).unwrap();
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["pollInterval"], 250);
    }

    #[test]
    fn zero_poll_interval_is_raised_to_floor() {
        let settings = WatcherSettings::from_json(r#"{"pollInterval": 0}"#).unwrap();
        assert_eq!(settings.poll_interval, MIN_POLL_INTERVAL);
    }

    #[test]
    fn disabled_or_anonymous_is_not_ready() {
        assert!(!WatcherSettings::default().is_ready());
        let settings = WatcherSettings {
            username: String::from("bob"),
            enabled: false,
            ..WatcherSettings::default()
        };
        assert!(!settings.is_ready());
    }
}
