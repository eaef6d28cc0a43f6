//! Shared test fixtures: board builders and a scripted rules server.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;
use xiangqi_client::{
    AutoMoveResponse, InitResponse, MoveDescriptor, MoveResponse, OracleError, OracleStatus,
    RulesOracle, Side,
};

static TRACING: Once = Once::new();

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builds a 180-character snapshot with pieces at the given (col, row) cells.
pub fn board_with(cells: &[(u8, u8)]) -> String {
    let mut slots: Vec<String> = vec!["99".to_string(); 90];
    for &(col, row) in cells {
        slots[col as usize * 10 + row as usize] = format!("{}{}", col, row);
    }
    slots.concat()
}

/// Builds the standard starting board: 32 pieces, 16 per side.
pub fn starting_board() -> String {
    let mut cells = Vec::new();
    for col in 0..9 {
        cells.push((col, 0));
        cells.push((col, 9));
    }
    for col in [1, 7] {
        cells.push((col, 2));
        cells.push((col, 7));
    }
    for col in [0, 2, 4, 6, 8] {
        cells.push((col, 3));
        cells.push((col, 6));
    }
    board_with(&cells)
}

/// Returns `board` with the piece at `from` moved to `to` (capture semantics:
/// whatever sat at `to` is gone).
pub fn moved(board: &str, from: (u8, u8), to: (u8, u8)) -> String {
    let mut slots: Vec<String> = (0..90).map(|i| board[i * 2..i * 2 + 2].to_string()).collect();
    slots[from.0 as usize * 10 + from.1 as usize] = "99".to_string();
    slots[to.0 as usize * 10 + to.1 as usize] = format!("{}{}", to.0, to.1);
    slots.concat()
}

/// A successful move response carrying the new board.
pub fn success_move(board: &str) -> MoveResponse {
    MoveResponse {
        status: OracleStatus::Success,
        board: Some(board.to_string()),
        game_over: false,
        winner: None,
        message: None,
    }
}

/// A move response ending the game.
pub fn winning_move(board: &str, winner: Side) -> MoveResponse {
    MoveResponse {
        status: OracleStatus::Success,
        board: Some(board.to_string()),
        game_over: true,
        winner: Some(winner),
        message: Some("Game over".to_string()),
    }
}

/// A rejected move.
pub fn invalid_move(message: &str) -> MoveResponse {
    MoveResponse {
        status: OracleStatus::Invalid,
        board: None,
        game_over: false,
        winner: None,
        message: Some(message.to_string()),
    }
}

/// A successful automated reply carrying the new board.
pub fn success_auto(board: &str) -> AutoMoveResponse {
    AutoMoveResponse {
        status: OracleStatus::Success,
        new_board: Some(board.to_string()),
        original_board: None,
        move_executed: None,
        game_over: false,
        winner: None,
        message: None,
    }
}

/// A failed automated reply.
pub fn failed_auto(message: &str) -> AutoMoveResponse {
    AutoMoveResponse {
        status: OracleStatus::Failed,
        new_board: None,
        original_board: None,
        move_executed: None,
        game_over: false,
        winner: None,
        message: Some(message.to_string()),
    }
}

/// An unreachable-server error, as the HTTP client would report it.
pub fn unavailable() -> OracleError {
    OracleError::Http {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

/// Scripted rules server. Responses are queued per endpoint and popped in
/// order; an unscripted call answers with a 500 so a test that over-calls
/// fails loudly instead of hanging.
pub struct FakeOracle {
    init_board: String,
    move_responses: Mutex<VecDeque<Result<MoveResponse, OracleError>>>,
    auto_responses: Mutex<VecDeque<Result<AutoMoveResponse, OracleError>>>,
    move_delay: Duration,
    auto_delay: Duration,
    pub init_calls: AtomicUsize,
    pub move_calls: AtomicUsize,
    pub auto_calls: AtomicUsize,
}

impl FakeOracle {
    pub fn new(init_board: impl Into<String>) -> Self {
        Self {
            init_board: init_board.into(),
            move_responses: Mutex::new(VecDeque::new()),
            auto_responses: Mutex::new(VecDeque::new()),
            move_delay: Duration::ZERO,
            auto_delay: Duration::ZERO,
            init_calls: AtomicUsize::new(0),
            move_calls: AtomicUsize::new(0),
            auto_calls: AtomicUsize::new(0),
        }
    }

    /// Holds every move response for `delay`, to keep a request in flight
    /// while the test pokes at the session.
    pub fn with_move_delay(mut self, delay: Duration) -> Self {
        self.move_delay = delay;
        self
    }

    /// Holds every automated-move response for `delay`, to keep the
    /// opponent's request in flight while the test pokes at the session.
    pub fn with_auto_delay(mut self, delay: Duration) -> Self {
        self.auto_delay = delay;
        self
    }

    pub fn push_move(&self, response: Result<MoveResponse, OracleError>) {
        self.move_responses.lock().unwrap().push_back(response);
    }

    pub fn push_auto(&self, response: Result<AutoMoveResponse, OracleError>) {
        self.auto_responses.lock().unwrap().push_back(response);
    }

    pub fn move_calls(&self) -> usize {
        self.move_calls.load(Ordering::SeqCst)
    }

    pub fn auto_calls(&self) -> usize {
        self.auto_calls.load(Ordering::SeqCst)
    }

    fn unscripted<T>() -> Result<T, OracleError> {
        Err(OracleError::Http {
            status: 500,
            message: "unscripted call".to_string(),
        })
    }
}

#[async_trait]
impl RulesOracle for FakeOracle {
    async fn init(&self) -> Result<InitResponse, OracleError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(InitResponse {
            status: OracleStatus::Success,
            board: Some(self.init_board.clone()),
            message: None,
        })
    }

    async fn submit_move(
        &self,
        _board: &str,
        _descriptor: MoveDescriptor,
    ) -> Result<MoveResponse, OracleError> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        if !self.move_delay.is_zero() {
            tokio::time::sleep(self.move_delay).await;
        }
        self.move_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Self::unscripted)
    }

    async fn auto_move(&self, _board: &str) -> Result<AutoMoveResponse, OracleError> {
        self.auto_calls.fetch_add(1, Ordering::SeqCst);
        if !self.auto_delay.is_zero() {
            tokio::time::sleep(self.auto_delay).await;
        }
        self.auto_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Self::unscripted)
    }
}
