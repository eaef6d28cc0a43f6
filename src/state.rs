//! Client-side game state.
//!
//! [`GameState`] is the authoritative client view of one game: the last
//! snapshot received from the rules server, the piece list derived from it,
//! whose turn it is, the current selection, and terminal status. It is mutated
//! only by the session in response to server responses and is discarded
//! wholesale on restart.

use crate::snapshot::{self, Piece, Position, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// A selected piece awaiting a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Cell the selected piece stands on.
    pub pos: Position,
    /// The piece at that cell when it was selected.
    pub piece: Piece,
}

/// Authoritative client-side view of one game.
///
/// Invariants:
/// - `pieces` is always exactly the decode of `snapshot`; the two never
///   diverge (a malformed snapshot decodes to no pieces).
/// - `selection`, when present, references a currently occupied cell belonging
///   to `turn`'s side.
/// - Once `game_over` is set, `turn` and `selection` are frozen until the
///   session restarts.
#[derive(Debug, Clone)]
pub struct GameState {
    snapshot: String,
    pieces: Vec<Piece>,
    turn: Side,
    selection: Option<Selection>,
    game_over: bool,
    winner: Option<Side>,
    message: Option<String>,
}

impl GameState {
    /// Creates an empty state: no pieces, Red to move.
    pub fn new() -> Self {
        Self {
            snapshot: String::new(),
            pieces: Vec::new(),
            turn: Side::Red,
            selection: None,
            game_over: false,
            winner: None,
            message: None,
        }
    }

    /// Returns the last snapshot received from the rules server.
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Returns the decoded piece list.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Returns the side to move.
    pub fn turn(&self) -> Side {
        self.turn
    }

    /// Returns the current selection.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Returns true once the game has ended.
    pub fn is_over(&self) -> bool {
        self.game_over
    }

    /// Returns the winner, if the game ended with one.
    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Returns the most recent user-facing message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the piece at the given cell, if any.
    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.pos == pos)
    }

    /// Replaces the snapshot and the derived piece list atomically.
    ///
    /// Observers never see the snapshot and pieces out of step: both fields
    /// are swapped in one mutation, and the selection is cleared. A malformed
    /// snapshot degrades to an empty piece list with a surfaced message
    /// rather than an error.
    #[instrument(skip(self, snapshot))]
    pub fn apply_snapshot(&mut self, snapshot: &str) {
        let pieces = match snapshot::decode(snapshot) {
            Ok(pieces) => pieces,
            Err(e) => {
                warn!(error = %e, "Discarding pieces from malformed snapshot");
                self.message = Some(e.to_string());
                Vec::new()
            }
        };
        debug!(count = pieces.len(), "Applied snapshot");
        self.snapshot = snapshot.to_string();
        self.pieces = pieces;
        self.selection = None;
    }

    /// Attempts to select the piece at `pos`.
    ///
    /// Succeeds only if a piece occupies the cell and it belongs to the side
    /// to move; otherwise no state changes and `false` is returned. Selecting
    /// is frozen once the game is over.
    #[instrument(skip(self))]
    pub fn select(&mut self, pos: Position) -> bool {
        if self.game_over {
            return false;
        }
        match self.piece_at(pos) {
            Some(piece) if piece.side == self.turn => {
                debug!(piece = %piece.id, "Selected piece");
                self.selection = Some(Selection {
                    pos,
                    piece: piece.clone(),
                });
                true
            }
            _ => false,
        }
    }

    /// Clears the selection. Idempotent.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Records a user-facing message, replacing any previous one.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Clears the user-facing message.
    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Marks the game as ended. A sink state: no later call mutates the turn,
    /// selection, or snapshot until the session restarts.
    #[instrument(skip(self))]
    pub fn set_terminal(&mut self, winner: Option<Side>) {
        debug!(?winner, "Game over");
        self.game_over = true;
        self.winner = winner;
        self.selection = None;
    }

    /// Hands the turn to the other side. No-op once the game is over.
    pub fn advance_turn(&mut self) {
        if self.game_over {
            return;
        }
        self.turn = self.turn.opponent();
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
