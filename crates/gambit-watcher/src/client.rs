//! HTTP client for the session API.
//!
//! Every endpoint answers with the `{success, data?, error?}` envelope.
//! A non-2xx status or `success: false` becomes [`ClientError::Status`]
//! carrying the server's message.

use std::time::Duration;

use gambit_types::{EvaluationResult, Session, SessionId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors talking to the session API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got an answer.
    #[error("session API unreachable: {0}")]
    Transport(String),

    /// The server answered with an error.
    #[error("session API returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the envelope, or the raw body.
        message: String,
    },

    /// The answer did not match the envelope.
    #[error("unexpected session API response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    game_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    fen: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_moves: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyseBody<'a> {
    fen: &'a str,
    depth: u32,
    top_moves: u32,
}

/// Client for one session API deployment.
#[derive(Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    /// Build a client for the API at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a session for `username`, or get the one it already has.
    pub async fn create_session(
        &self,
        username: &str,
        game_id: Option<&str>,
    ) -> Result<Session, ClientError> {
        let body = CreateSessionBody { username, game_id };
        let request = self.client.post(self.url("/api/v1/sessions")).json(&body);
        let session: Session = send(request).await?;
        debug!(session_id = %session.id, username, "Session ready");
        Ok(session)
    }

    /// Fetch a session. `Ok(None)` if the server no longer has it.
    pub async fn get_session(&self, session_id: SessionId) -> Result<Option<Session>, ClientError> {
        let path = format!("/api/v1/sessions/{session_id}");
        match send(self.client.get(self.url(&path))).await {
            Ok(session) => Ok(Some(session)),
            Err(ClientError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Submit the position on a session's board.
    pub async fn analyse_session(
        &self,
        session_id: SessionId,
        fen: &str,
        depth: Option<u32>,
        top_moves: Option<u32>,
    ) -> Result<EvaluationResult, ClientError> {
        let path = format!("/api/v1/analysis/session/{session_id}/analyse");
        let body = UpdateBody {
            fen,
            depth,
            top_moves,
        };
        send(self.client.post(self.url(&path)).json(&body)).await
    }

    /// Evaluate a position outside any session.
    pub async fn analyse_position(
        &self,
        fen: &str,
        depth: u32,
        top_moves: u32,
    ) -> Result<EvaluationResult, ClientError> {
        let body = AnalyseBody {
            fen,
            depth,
            top_moves,
        };
        send(self.client.post(self.url("/api/v1/analysis/position")).json(&body)).await
    }

    /// Whether the API answers its health check.
    pub async fn health_check(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    let envelope: Envelope<T> = match serde_json::from_str(&text) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: text,
            });
        }
        Err(e) => return Err(ClientError::Decode(e.to_string())),
    };

    if !status.is_success() || !envelope.success {
        return Err(ClientError::Status {
            status: status.as_u16(),
            message: envelope.error.unwrap_or_else(|| status.to_string()),
        });
    }
    envelope
        .data
        .ok_or_else(|| ClientError::Decode(String::from("envelope has no data")))
}
