//! Client-side session state and change forwarding.
//!
//! One [`SessionContext`] is built when the watcher starts and handed to
//! whatever needs it. [`forward_changes`] is the single consumer of the
//! watcher's change channel.

use std::time::Duration;

use gambit_types::{EvaluationResult, SessionId, normalize_username};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::{AnalysisClient, ClientError};
use crate::extractor::ExtractedPosition;
use crate::settings::WatcherSettings;

/// How long a known session is trusted before the server is asked whether
/// it still exists.
pub const SESSION_RECHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct KnownSession {
    id: SessionId,
    confirmed_at: Instant,
}

/// Settings, API client and the session the watcher reports into.
pub struct SessionContext {
    settings: WatcherSettings,
    client: AnalysisClient,
    session: Option<KnownSession>,
    recheck_interval: Duration,
}

impl SessionContext {
    /// Context with no session yet.
    pub const fn new(settings: WatcherSettings, client: AnalysisClient) -> Self {
        Self {
            settings,
            client,
            session: None,
            recheck_interval: SESSION_RECHECK_INTERVAL,
        }
    }

    /// Override how long a known session is trusted without asking.
    #[must_use]
    pub const fn with_recheck_interval(mut self, every: Duration) -> Self {
        self.recheck_interval = every;
        self
    }

    /// Current settings.
    pub const fn settings(&self) -> &WatcherSettings {
        &self.settings
    }

    /// The API client.
    pub const fn client(&self) -> &AnalysisClient {
        &self.client
    }

    /// Session in use, if one has been opened.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.map(|known| known.id)
    }

    /// Replace the settings. Switching user drops the current session.
    pub fn update_settings(&mut self, settings: WatcherSettings) {
        if normalize_username(&settings.username) != normalize_username(&self.settings.username) {
            self.session = None;
        }
        self.settings = settings;
    }

    /// Return the session to report into, opening one if needed.
    ///
    /// A known session older than the recheck interval is looked up first;
    /// if the server has expired or deleted it, a new one is opened.
    /// `Ok(None)` means the watcher is disabled or has no username.
    pub async fn ensure_session(&mut self) -> Result<Option<SessionId>, ClientError> {
        if !self.settings.is_ready() {
            return Ok(None);
        }
        if let Some(known) = self.session {
            if known.confirmed_at.elapsed() < self.recheck_interval {
                return Ok(Some(known.id));
            }
            if self.client.get_session(known.id).await?.is_some() {
                self.session = Some(KnownSession {
                    id: known.id,
                    confirmed_at: Instant::now(),
                });
                return Ok(Some(known.id));
            }
            info!(session_id = %known.id, "Session gone on the server, opening a new one");
            self.session = None;
        }
        let session = self
            .client
            .create_session(self.settings.username.trim(), None)
            .await?;
        info!(session_id = %session.id, username = %session.username, "Session opened");
        self.session = Some(KnownSession {
            id: session.id,
            confirmed_at: Instant::now(),
        });
        Ok(Some(session.id))
    }

    /// Submit one position for analysis in the current session, with the
    /// configured depth and move count.
    ///
    /// `Ok(None)` means nothing was sent because the watcher is not ready.
    pub async fn submit(&mut self, fen: &str) -> Result<Option<EvaluationResult>, ClientError> {
        let Some(session_id) = self.ensure_session().await? else {
            return Ok(None);
        };
        let depth = Some(self.settings.analysis_depth);
        let top_moves = Some(self.settings.top_moves_count);
        match self
            .client
            .analyse_session(session_id, fen, depth, top_moves)
            .await
        {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                if matches!(e, ClientError::Status { status: 404, .. }) {
                    // Only servers that refuse unknown sessions answer 404
                    // here; the next submission opens a new session.
                    self.session = None;
                }
                Err(e)
            }
        }
    }
}

/// Forward watcher changes to the session API until the channel closes.
///
/// Changes that pile up while a submission is in flight are collapsed to
/// the newest one. Failures are logged and forwarding carries on.
pub async fn forward_changes<F>(
    ctx: &mut SessionContext,
    mut changes: mpsc::Receiver<ExtractedPosition>,
    mut on_result: F,
) where
    F: FnMut(EvaluationResult),
{
    while let Some(mut latest) = changes.recv().await {
        let mut skipped: usize = 0;
        while let Ok(newer) = changes.try_recv() {
            latest = newer;
            skipped = skipped.saturating_add(1);
        }
        if skipped > 0 {
            debug!(skipped, "Coalesced queued positions");
        }
        if latest.is_approximate() {
            debug!(fen = %latest.fen, "Submitting reconstructed position");
        }

        match ctx.submit(&latest.fen).await {
            Ok(Some(result)) => on_result(result),
            Ok(None) => debug!("Watcher not ready, position dropped"),
            Err(e) => warn!(error = %e, fen = %latest.fen, "Failed to submit position"),
        }
    }
    debug!("Change channel closed, forwarding stopped");
}
