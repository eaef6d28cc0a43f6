//! Tests for the client-side game state machine.

mod common;

use common::{board_with, starting_board};
use xiangqi_client::{decode, GameState, Position, Side};

fn pos(col: u8, row: u8) -> Position {
    Position { col, row }
}

#[test]
fn apply_snapshot_replaces_pieces_wholesale() {
    let mut state = GameState::new();
    let board = starting_board();
    state.apply_snapshot(&board);

    assert_eq!(state.snapshot(), board);
    assert_eq!(state.pieces(), decode(&board).unwrap());
}

#[test]
fn apply_snapshot_clears_selection() {
    let mut state = GameState::new();
    state.apply_snapshot(&starting_board());
    assert!(state.select(pos(4, 9)));
    assert!(state.selection().is_some());

    state.apply_snapshot(&board_with(&[(4, 8)]));
    assert!(state.selection().is_none());
}

#[test]
fn malformed_snapshot_degrades_to_no_pieces() {
    let mut state = GameState::new();
    state.apply_snapshot(&starting_board());
    assert_eq!(state.pieces().len(), 32);

    state.apply_snapshot("too short");
    assert!(state.pieces().is_empty());
    assert!(state.message().is_some());
}

#[test]
fn select_requires_own_piece() {
    let mut state = GameState::new();
    state.apply_snapshot(&starting_board());
    assert_eq!(state.turn(), Side::Red);

    // Empty cell.
    assert!(!state.select(pos(4, 5)));
    assert!(state.selection().is_none());

    // Opponent's piece.
    assert!(!state.select(pos(4, 0)));
    assert!(state.selection().is_none());

    // Own piece.
    assert!(state.select(pos(4, 9)));
    let selection = state.selection().unwrap();
    assert_eq!(selection.pos, pos(4, 9));
    assert_eq!(selection.piece.side, Side::Red);
}

#[test]
fn select_follows_the_turn() {
    let mut state = GameState::new();
    state.apply_snapshot(&starting_board());

    state.advance_turn();
    assert_eq!(state.turn(), Side::Black);

    assert!(!state.select(pos(4, 9)));
    assert!(state.select(pos(4, 0)));
}

#[test]
fn clear_selection_is_idempotent() {
    let mut state = GameState::new();
    state.apply_snapshot(&starting_board());
    assert!(state.select(pos(4, 9)));

    state.clear_selection();
    assert!(state.selection().is_none());
    state.clear_selection();
    assert!(state.selection().is_none());
}

#[test]
fn advance_turn_flips_sides() {
    let mut state = GameState::new();
    assert_eq!(state.turn(), Side::Red);
    state.advance_turn();
    assert_eq!(state.turn(), Side::Black);
    state.advance_turn();
    assert_eq!(state.turn(), Side::Red);
}

#[test]
fn terminal_is_a_sink_state() {
    let mut state = GameState::new();
    state.apply_snapshot(&starting_board());
    assert!(state.select(pos(4, 9)));

    state.set_terminal(Some(Side::Red));
    assert!(state.is_over());
    assert_eq!(state.winner(), Some(Side::Red));
    assert!(state.selection().is_none());

    // Frozen: neither the turn nor the selection can change now.
    let turn_before = state.turn();
    state.advance_turn();
    assert_eq!(state.turn(), turn_before);
    assert!(!state.select(pos(4, 9)));
    assert!(state.selection().is_none());
}

#[test]
fn terminal_without_winner() {
    let mut state = GameState::new();
    state.apply_snapshot(&starting_board());
    state.set_terminal(None);
    assert!(state.is_over());
    assert_eq!(state.winner(), None);
}

#[test]
fn message_is_overwritten_not_accumulated() {
    let mut state = GameState::new();
    state.set_message("first");
    state.set_message("second");
    assert_eq!(state.message(), Some("second"));
    state.clear_message();
    assert_eq!(state.message(), None);
}
