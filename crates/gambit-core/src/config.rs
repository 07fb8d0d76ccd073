//! Orchestration settings.

use std::str::FromStr;
use std::time::Duration;

/// Default bound on a single engine call.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(30);

/// What a cycle does when the session it names does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingSessionPolicy {
    /// Evaluate and broadcast anyway, without persisting the position.
    #[default]
    Tolerate,
    /// Fail the cycle with `NotFound` before contacting the engine.
    Abort,
}

impl FromStr for MissingSessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tolerate" => Ok(Self::Tolerate),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown missing-session policy: {other}")),
        }
    }
}

/// Settings for [`AnalysisOrchestrator`](crate::AnalysisOrchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Hard bound on each engine call. Exceeding it fails the cycle.
    pub engine_timeout: Duration,
    /// Behaviour when a position arrives for an unknown session.
    pub missing_session: MissingSessionPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            engine_timeout: DEFAULT_ENGINE_TIMEOUT,
            missing_session: MissingSessionPolicy::Tolerate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parsing() {
        assert_eq!("Tolerate".parse(), Ok(MissingSessionPolicy::Tolerate));
        assert_eq!(" abort ".parse(), Ok(MissingSessionPolicy::Abort));
        assert!("retry".parse::<MissingSessionPolicy>().is_err());
    }
}
