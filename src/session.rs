//! Game session orchestration.
//!
//! [`GameSession`] turns board-cell activations into selections or move
//! requests, applies rules server responses to the game state, and hands the
//! turn to the automated opponent when the mode calls for it. All state
//! mutation happens under one mutex that is never held across an await; the
//! single-flight guards (`human_busy` / `opponent_busy`) are the only
//! concurrency control, so at most one request per category is outstanding
//! and the two categories are mutually exclusive by turn ownership.
//!
//! Every request is tagged with the session generation at launch. A restart
//! bumps the generation, so a response that lands after a restart is
//! discarded instead of mutating the fresh game.

use crate::config::{ClientConfig, GameMode};
use crate::oracle::{MoveDescriptor, MoveResponse, OracleError, OracleStatus, RulesOracle};
use crate::snapshot::{Piece, Position, Side};
use crate::state::{GameState, Selection};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Messages sent from the session to its UI collaborator.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State changed; carries a fresh read model.
    StateChanged(SessionView),
    /// The automated opponent's request is in flight.
    OpponentThinking,
    /// Game ended.
    GameOver {
        /// Winning side, when the server named one.
        winner: Option<Side>,
    },
}

/// Read model of the session, cloned out for rendering.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Decoded piece list.
    pub pieces: Vec<Piece>,
    /// Side to move.
    pub turn: Side,
    /// Current selection.
    pub selection: Option<Selection>,
    /// True once the game has ended.
    pub game_over: bool,
    /// Winning side, when the game ended with one.
    pub winner: Option<Side>,
    /// A human move request is in flight.
    pub human_busy: bool,
    /// An automated-turn request is in flight.
    pub opponent_busy: bool,
    /// Most recent user-facing message.
    pub message: Option<String>,
}

impl SessionView {
    /// Returns the piece at the given cell, if any.
    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.pos == pos)
    }
}

/// Shared mutable session state. One writer at a time by construction.
#[derive(Debug)]
struct SessionState {
    game: GameState,
    human_busy: bool,
    opponent_busy: bool,
    generation: u64,
}

/// What remains after a human move response, decided under the lock and
/// acted on after it is released.
enum AfterMove {
    Nothing,
    ScheduleReply(u64),
    GameOver(Option<Side>),
}

/// One game against the rules server.
///
/// Cheap to clone; clones share the same session. Lifecycle is
/// create -> [`init_game`](Self::init_game) -> mutate by events ->
/// [`restart_game`](Self::restart_game) or drop.
#[derive(Clone)]
pub struct GameSession {
    inner: Arc<Mutex<SessionState>>,
    oracle: Arc<dyn RulesOracle>,
    config: ClientConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl GameSession {
    /// Creates a session talking to `oracle`, emitting events on `events`.
    pub fn new(
        oracle: Arc<dyn RulesOracle>,
        config: ClientConfig,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        info!(mode = %config.mode(), "Creating game session");
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                game: GameState::new(),
                human_busy: false,
                opponent_busy: false,
                generation: 0,
            })),
            oracle,
            config,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap()
    }

    /// Returns a fresh read model of the session.
    pub fn view(&self) -> SessionView {
        let state = self.lock();
        Self::view_of(&state)
    }

    fn view_of(state: &SessionState) -> SessionView {
        SessionView {
            pieces: state.game.pieces().to_vec(),
            turn: state.game.turn(),
            selection: state.game.selection().cloned(),
            game_over: state.game.is_over(),
            winner: state.game.winner(),
            human_busy: state.human_busy,
            opponent_busy: state.opponent_busy,
            message: state.game.message().map(String::from),
        }
    }

    /// A dropped receiver means the UI went away; the session keeps working.
    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn emit_state(&self) {
        let view = {
            let state = self.lock();
            Self::view_of(&state)
        };
        self.emit(SessionEvent::StateChanged(view));
    }

    fn auto_mode(&self) -> bool {
        matches!(self.config.mode(), GameMode::HumanVsAuto)
    }

    /// Starts a new game by requesting the starting board.
    ///
    /// Bumps the session generation, so responses still in flight from the
    /// previous game are discarded when they land.
    #[instrument(skip(self))]
    pub async fn init_game(&self) {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.game = GameState::new();
            state.human_busy = true;
            state.opponent_busy = false;
            debug!(generation = state.generation, "Requesting starting board");
            state.generation
        };
        self.emit_state();

        let result = self.oracle.init().await;

        {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("Discarding stale init response");
                return;
            }
            state.human_busy = false;
            match result {
                Ok(response) if response.status.is_success() => match response.board.as_deref() {
                    Some(board) => {
                        state.game.clear_message();
                        state.game.apply_snapshot(board);
                        info!(pieces = state.game.pieces().len(), "Game initialized");
                    }
                    None => state.game.set_message("Rules server returned no board"),
                },
                Ok(response) => {
                    let message = response
                        .message
                        .unwrap_or_else(|| "Failed to initialize board".to_string());
                    warn!(message = %message, "Init rejected by rules server");
                    state.game.set_message(message);
                }
                Err(e) => {
                    warn!(error = %e, "Init request failed");
                    state.game.set_message("Could not reach the rules server");
                }
            }
        }
        self.emit_state();
    }

    /// Restarts the session. Equivalent to [`init_game`](Self::init_game).
    #[instrument(skip(self))]
    pub async fn restart_game(&self) {
        info!("Restarting game");
        self.init_game().await;
    }

    /// Handles a user interaction with a board cell.
    ///
    /// With no selection the activation is a selection attempt; with one it is
    /// a move attempt submitted to the rules server. Activations are ignored
    /// outright when the game is over, a request of either category is in
    /// flight, or it is not the human side's turn.
    #[instrument(skip(self), fields(pos = %pos))]
    pub async fn handle_cell_activation(&self, pos: Position) {
        let launched = {
            let mut state = self.lock();
            if state.game.is_over() || state.human_busy || state.opponent_busy {
                debug!("Ignoring activation: busy or game over");
                return;
            }
            if self.auto_mode() && state.game.turn() != Side::Red {
                debug!("Ignoring activation: not the human side's turn");
                return;
            }

            match state.game.selection().map(|sel| sel.pos) {
                None => {
                    state.game.select(pos);
                    None
                }
                Some(from) => {
                    let descriptor = MoveDescriptor { from, to: pos };
                    let board = state.game.snapshot().to_string();
                    state.human_busy = true;
                    Some((board, descriptor, state.generation))
                }
            }
        };

        let Some((board, descriptor, generation)) = launched else {
            self.emit_state();
            return;
        };
        self.emit_state();

        let result = self.oracle.submit_move(&board, descriptor).await;

        let after = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("Discarding stale move response");
                return;
            }
            state.human_busy = false;
            self.apply_move_result(&mut state, pos, result)
        };
        self.emit_state();

        match after {
            AfterMove::Nothing => {}
            AfterMove::ScheduleReply(generation) => self.schedule_opponent_reply(generation),
            AfterMove::GameOver(winner) => self.emit(SessionEvent::GameOver { winner }),
        }
    }

    /// Applies a move response under the lock. Either the whole response is
    /// applied (snapshot plus turn or terminal state) or none of it is.
    fn apply_move_result(
        &self,
        state: &mut SessionState,
        activated: Position,
        result: Result<MoveResponse, OracleError>,
    ) -> AfterMove {
        match result {
            Ok(response) if response.status.is_success() => match response.board.as_deref() {
                Some(board) => {
                    state.game.clear_message();
                    state.game.apply_snapshot(board);
                    if response.game_over {
                        info!(winner = ?response.winner, "Move ended the game");
                        state.game.set_terminal(response.winner);
                        AfterMove::GameOver(response.winner)
                    } else {
                        state.game.advance_turn();
                        debug!(turn = %state.game.turn(), "Turn advanced");
                        if self.auto_mode() && state.game.turn() == Side::Black {
                            AfterMove::ScheduleReply(state.generation)
                        } else {
                            AfterMove::Nothing
                        }
                    }
                }
                None => {
                    state.game.set_message("Rules server returned no board");
                    AfterMove::Nothing
                }
            },
            Ok(response) if response.status == OracleStatus::Invalid => {
                let reason = response.message.unwrap_or_default();
                debug!(reason = %reason, "Move rejected");
                state.game.set_message(format!("Invalid move: {}", reason));
                // Reinterpret the activation as a fresh selection attempt.
                if !state.game.select(activated) {
                    state.game.clear_selection();
                }
                AfterMove::Nothing
            }
            Ok(response) => {
                let message = response.message.unwrap_or_else(|| "Move failed".to_string());
                warn!(message = %message, "Rules server reported an error");
                state.game.set_message(message);
                AfterMove::Nothing
            }
            Err(e) => {
                warn!(error = %e, "Move request failed");
                state.game.set_message("Could not reach the rules server");
                AfterMove::Nothing
            }
        }
    }

    /// Schedules the automated reply after the configured delay.
    ///
    /// The delay is cosmetic, giving the preceding move a chance to render.
    /// All guards are re-checked when the timer fires, not at scheduling
    /// time, in case the game restarted or ended in between.
    fn schedule_opponent_reply(&self, generation: u64) {
        debug!(
            delay_ms = self.config.reply_delay().as_millis() as u64,
            "Scheduling automated reply"
        );
        let session = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(session.config.reply_delay()).await;
            session.run_opponent_turn(generation).await;
        });
    }

    /// Requests and applies a move on behalf of the automated side.
    #[instrument(skip(self))]
    async fn run_opponent_turn(&self, generation: u64) {
        let board = {
            let mut state = self.lock();
            if state.generation != generation
                || state.game.is_over()
                || state.human_busy
                || state.opponent_busy
            {
                debug!("Skipping automated turn: guard rejected");
                return;
            }
            if !self.auto_mode() || state.game.turn() != Side::Black {
                debug!(turn = %state.game.turn(), "Skipping automated turn: not Black's turn");
                return;
            }
            state.opponent_busy = true;
            state.game.snapshot().to_string()
        };
        self.emit(SessionEvent::OpponentThinking);
        self.emit_state();

        let result = self.oracle.auto_move(&board).await;

        let ended = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("Discarding stale automated move response");
                return;
            }
            state.opponent_busy = false;
            match result {
                Ok(response) if response.status.is_success() => {
                    match response.new_board.as_deref() {
                        Some(new_board) => {
                            state.game.clear_message();
                            state.game.apply_snapshot(new_board);
                            if response.game_over {
                                info!(winner = ?response.winner, "Automated move ended the game");
                                state.game.set_terminal(response.winner);
                                Some(response.winner)
                            } else {
                                state.game.advance_turn();
                                None
                            }
                        }
                        None => {
                            state.game.set_message("Rules server returned no board");
                            None
                        }
                    }
                }
                Ok(response) => {
                    // No retry: the turn stays with Black until the user
                    // restarts.
                    let message = response
                        .message
                        .unwrap_or_else(|| "Automated move failed".to_string());
                    warn!(message = %message, "Automated move rejected");
                    state.game.set_message(message);
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Automated move request failed");
                    state.game.set_message("Could not reach the rules server");
                    None
                }
            }
        };
        self.emit_state();

        if let Some(winner) = ended {
            self.emit(SessionEvent::GameOver { winner });
        }
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
