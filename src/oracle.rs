//! Rules server contract and HTTP client.
//!
//! The client never judges a move itself: legality, game-end detection, and
//! the automated opponent all live behind the [`RulesOracle`] trait. The
//! production implementation is [`HttpRulesOracle`], speaking the rules
//! server's JSON API; tests substitute scripted implementations.

use crate::snapshot::{Position, Side};
use async_trait::async_trait;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// A move request: from-cell and to-cell.
///
/// The wire form is the four-digit concatenation of from-column, from-row,
/// to-column, to-row, e.g. `"4948"` for (4,9) -> (4,8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveDescriptor {
    /// Cell the piece moves from.
    pub from: Position,
    /// Cell the piece moves to.
    pub to: Position,
}

impl std::fmt::Display for MoveDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Status discriminant shared by all rules server responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleStatus {
    /// Request succeeded; any returned board is authoritative.
    Success,
    /// Submitted move was rejected as illegal.
    Invalid,
    /// Automated opponent proposed an illegal move.
    InvalidMove,
    /// Automated opponent could not produce a move.
    Failed,
    /// Server-side error.
    Error,
}

impl OracleStatus {
    /// Returns true for [`OracleStatus::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, OracleStatus::Success)
    }
}

/// Winner strings arrive as `"red"`/`"black"`; anything else (missing, null,
/// or unrecognized) reads as no winner rather than a decode failure.
fn lenient_winner<'de, D>(de: D) -> Result<Option<Side>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.as_deref().and_then(|s| Side::from_str(s).ok()))
}

/// Response to [`RulesOracle::init`].
#[derive(Debug, Clone, Deserialize)]
pub struct InitResponse {
    /// Request status.
    pub status: OracleStatus,
    /// Fresh starting snapshot, present on success.
    #[serde(default)]
    pub board: Option<String>,
    /// Human-readable server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to [`RulesOracle::submit_move`].
#[derive(Debug, Clone, Deserialize)]
pub struct MoveResponse {
    /// Request status; `invalid` means the move was rejected.
    pub status: OracleStatus,
    /// Board after the move, present on success.
    #[serde(default)]
    pub board: Option<String>,
    /// True when the move ended the game.
    #[serde(default)]
    pub game_over: bool,
    /// Winning side when the game ended.
    #[serde(default, deserialize_with = "lenient_winner")]
    pub winner: Option<Side>,
    /// Human-readable server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to [`RulesOracle::auto_move`].
#[derive(Debug, Clone, Deserialize)]
pub struct AutoMoveResponse {
    /// Request status; anything but `success` leaves the board unchanged.
    pub status: OracleStatus,
    /// Board after the automated move, present on success.
    #[serde(default)]
    pub new_board: Option<String>,
    /// Board the move was computed from.
    #[serde(default)]
    pub original_board: Option<String>,
    /// Wire form of the executed move.
    #[serde(default)]
    pub move_executed: Option<String>,
    /// True when the move ended the game.
    #[serde(default)]
    pub game_over: bool,
    /// Winning side when the game ended.
    #[serde(default, deserialize_with = "lenient_winner")]
    pub winner: Option<Side>,
    /// Human-readable server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Rules server failure: no definitive verdict was received.
#[derive(Debug, Display, Error, From)]
pub enum OracleError {
    /// Transport-level failure (connect, timeout, malformed body).
    #[display("rules server unreachable: {_0}")]
    Transport(reqwest::Error),
    /// Server answered outside the 2xx range.
    #[display("rules server returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        #[error(not(source))]
        message: String,
    },
}

/// External authority for move validation and the automated opponent.
#[async_trait]
pub trait RulesOracle: Send + Sync {
    /// Requests a fresh starting board.
    async fn init(&self) -> Result<InitResponse, OracleError>;

    /// Submits a move for validation and execution.
    async fn submit_move(
        &self,
        board: &str,
        descriptor: MoveDescriptor,
    ) -> Result<MoveResponse, OracleError>;

    /// Requests a move on behalf of the automated (Black) side.
    async fn auto_move(&self, board: &str) -> Result<AutoMoveResponse, OracleError>;
}

/// HTTP client for the rules server's JSON API.
#[derive(Debug, Clone)]
pub struct HttpRulesOracle {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRulesOracle {
    /// Creates a client for the server at `base_url` (scheme + host + port).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    /// Checks the HTTP status and decodes the JSON body.
    async fn read_response<T>(response: reqwest::Response) -> Result<T, OracleError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Error bodies carry {"status": "error", "message": ...}.
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            warn!(status = status.as_u16(), message = %message, "Rules server error");
            return Err(OracleError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RulesOracle for HttpRulesOracle {
    #[instrument(skip(self))]
    async fn init(&self) -> Result<InitResponse, OracleError> {
        debug!("Requesting starting board");
        let response = self.client.get(self.url("init")).send().await?;
        Self::read_response(response).await
    }

    #[instrument(skip(self, board), fields(descriptor = %descriptor))]
    async fn submit_move(
        &self,
        board: &str,
        descriptor: MoveDescriptor,
    ) -> Result<MoveResponse, OracleError> {
        debug!("Submitting move");
        let body = serde_json::json!({
            "board": board,
            "move": descriptor.to_string(),
        });
        let response = self
            .client
            .post(self.url("move"))
            .json(&body)
            .send()
            .await?;
        Self::read_response(response).await
    }

    #[instrument(skip(self, board))]
    async fn auto_move(&self, board: &str) -> Result<AutoMoveResponse, OracleError> {
        debug!("Requesting automated move");
        let body = serde_json::json!({ "board": board });
        let response = self
            .client
            .post(self.url("ai/black_auto_move"))
            .json(&body)
            .send()
            .await?;
        Self::read_response(response).await
    }
}
