//! Xiangqi client library - board decoding and turn orchestration
//!
//! This library is the client half of a xiangqi (Chinese chess) game played
//! against a remote rules server. The server is the sole authority on move
//! legality, game end, and the automated opponent; this crate decodes its
//! opaque board snapshots, tracks whose turn it is and what is selected, and
//! orchestrates the request/response cycle around human moves and automated
//! replies.
//!
//! # Architecture
//!
//! - **Snapshot**: pure decoding of the 180-character board format
//! - **State**: the authoritative client-side game view
//! - **Oracle**: the rules server contract (HTTP+JSON) behind a trait
//! - **Session**: cell activations, single-flight guards, opponent scheduling
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use xiangqi_client::{ClientConfig, GameSession, HttpRulesOracle};
//!
//! # async fn example() {
//! let config = ClientConfig::default();
//! let oracle = Arc::new(HttpRulesOracle::new(config.base_url().clone()));
//! let (event_tx, mut event_rx) = mpsc::unbounded_channel();
//!
//! let session = GameSession::new(oracle, config, event_tx);
//! session.init_game().await;
//!
//! while let Some(event) = event_rx.recv().await {
//!     // hand events to the UI
//!     let _ = event;
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod oracle;
mod session;
mod snapshot;
mod state;

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError, GameMode};

// Crate-level exports - Rules server contract
pub use oracle::{
    AutoMoveResponse, HttpRulesOracle, InitResponse, MoveDescriptor, MoveResponse, OracleError,
    OracleStatus, RulesOracle,
};

// Crate-level exports - Session orchestration
pub use session::{GameSession, SessionEvent, SessionView};

// Crate-level exports - Snapshot codec
pub use snapshot::{decode, Piece, PieceLabel, Position, Side, SnapshotError, SNAPSHOT_LEN};

// Crate-level exports - Game state
pub use state::{GameState, Selection};
