//! Board snapshot decoding.
//!
//! The rules server exchanges board state as an opaque 180-character string:
//! 90 consecutive 2-character slots, one per board cell in column-major order.
//! A slot holds either the sentinel `"99"` (no piece) or the literal
//! `(column, row)` digit pair of the piece occupying that cell. The format
//! carries no piece type; [`decode`] reconstructs a display label from the
//! home-rank heuristic, which is best-effort classification, not identity.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Expected byte length of a board snapshot.
pub const SNAPSHOT_LEN: usize = 180;

/// Slot content marking an empty cell.
const EMPTY_SLOT: [u8; 2] = [b'9', b'9'];

/// A cell on the 9x10 xiangqi board.
///
/// Column 0 is the leftmost file; row 0 is the far rank (Black's back rank),
/// row 9 the near rank (Red's back rank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column (file), 0-8.
    pub col: u8,
    /// Row (rank), 0-9.
    pub row: u8,
}

impl Position {
    /// Creates a position. Returns `None` if either coordinate is off the board.
    pub fn new(col: u8, row: u8) -> Option<Self> {
        if col <= 8 && row <= 9 {
            Some(Self { col, row })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.col, self.row)
    }
}

/// A side in the game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// Red moves first and is the human side in human-vs-auto play.
    Red,
    /// Black moves second.
    Black,
}

impl Side {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// Derives the side from a row.
    ///
    /// Rows 6-9 are Red, everything else Black. The single threshold means
    /// river rows 4/5 degrade to Black; that boundary is deliberate and must
    /// stay as a literal `>= 6` comparison.
    pub fn from_row(row: u8) -> Self {
        if row >= 6 {
            Side::Red
        } else {
            Side::Black
        }
    }
}

/// Best-effort piece classification from the home-rank heuristic.
///
/// The snapshot format does not carry piece type, so the label is inferred
/// from the rank a piece currently stands on. Once a piece leaves its home
/// rank the heuristic falls through to [`PieceLabel::Unknown`]; there is no
/// fallback beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceLabel {
    /// 车 - back-rank files 0 and 8.
    Chariot,
    /// 马 - back-rank files 1 and 7.
    Horse,
    /// 相/象 - back-rank files 2 and 6.
    Elephant,
    /// 仕/士 - back-rank files 3 and 5.
    Advisor,
    /// 帅/将 - back-rank file 4.
    General,
    /// 炮 - cannon rank (rows 7 and 2).
    Cannon,
    /// 兵/卒 - soldier rank (rows 6 and 3).
    Soldier,
    /// Piece off its home rank; classification unavailable.
    Unknown,
}

/// Back-rank layout by column: 车马相仕帅仕相马车.
const BACK_RANK: [PieceLabel; 9] = [
    PieceLabel::Chariot,
    PieceLabel::Horse,
    PieceLabel::Elephant,
    PieceLabel::Advisor,
    PieceLabel::General,
    PieceLabel::Advisor,
    PieceLabel::Elephant,
    PieceLabel::Horse,
    PieceLabel::Chariot,
];

impl PieceLabel {
    /// Classifies a piece from its side and current position.
    pub fn classify(side: Side, pos: Position) -> Self {
        match (side, pos.row) {
            (Side::Red, 9) | (Side::Black, 0) => BACK_RANK[pos.col as usize],
            (Side::Red, 7) | (Side::Black, 2) => PieceLabel::Cannon,
            (Side::Red, 6) | (Side::Black, 3) => PieceLabel::Soldier,
            _ => PieceLabel::Unknown,
        }
    }

    /// Returns the display glyph for this label on the given side.
    pub fn glyph(self, side: Side) -> &'static str {
        match (self, side) {
            (PieceLabel::Chariot, _) => "车",
            (PieceLabel::Horse, _) => "马",
            (PieceLabel::Elephant, Side::Red) => "相",
            (PieceLabel::Elephant, Side::Black) => "象",
            (PieceLabel::Advisor, Side::Red) => "仕",
            (PieceLabel::Advisor, Side::Black) => "士",
            (PieceLabel::General, Side::Red) => "帅",
            (PieceLabel::General, Side::Black) => "将",
            (PieceLabel::Cannon, _) => "炮",
            (PieceLabel::Soldier, Side::Red) => "兵",
            (PieceLabel::Soldier, Side::Black) => "卒",
            (PieceLabel::Unknown, _) => "未知",
        }
    }
}

/// A decoded piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Identifier recomputed on every decode as `"{side}_{col}_{row}"`.
    ///
    /// Not a stable identity: it changes whenever the piece moves. UI diffing
    /// must treat it as positional, not persistent.
    pub id: String,
    /// Owning side, derived from the row threshold.
    pub side: Side,
    /// Best-effort classification.
    pub label: PieceLabel,
    /// Current cell.
    pub pos: Position,
}

impl Piece {
    fn at(pos: Position) -> Self {
        let side = Side::from_row(pos.row);
        Piece {
            id: format!("{}_{}_{}", side, pos.col, pos.row),
            side,
            label: PieceLabel::classify(side, pos),
            pos,
        }
    }

    /// Returns the display glyph for this piece.
    pub fn glyph(&self) -> &'static str {
        self.label.glyph(self.side)
    }
}

/// Snapshot decode error.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SnapshotError {
    /// Snapshot is not exactly [`SNAPSHOT_LEN`] bytes.
    #[display("malformed snapshot: expected {SNAPSHOT_LEN} characters, got {actual}")]
    BadLength {
        /// Observed byte length.
        actual: usize,
    },
}

/// Decodes a board snapshot into its piece list.
///
/// A snapshot of the wrong length yields [`SnapshotError::BadLength`]; the
/// caller treats that as "no pieces decoded". Individual malformed slots are
/// noise, not errors: a slot whose characters are not digits or whose column
/// is off the board is skipped so the remaining pieces still decode. Output
/// order is slot order. Duplicate occupied slots naming the same cell are
/// both kept; the codec does not police occupancy.
#[instrument(skip(snapshot))]
pub fn decode(snapshot: &str) -> Result<Vec<Piece>, SnapshotError> {
    let bytes = snapshot.as_bytes();
    if bytes.len() != SNAPSHOT_LEN {
        warn!(actual = bytes.len(), "Snapshot has wrong length");
        return Err(SnapshotError::BadLength {
            actual: bytes.len(),
        });
    }

    let mut pieces = Vec::new();
    for slot in 0..SNAPSHOT_LEN / 2 {
        let pair = [bytes[2 * slot], bytes[2 * slot + 1]];
        if pair == EMPTY_SLOT {
            continue;
        }
        if !pair[0].is_ascii_digit() || !pair[1].is_ascii_digit() {
            continue;
        }
        match Position::new(pair[0] - b'0', pair[1] - b'0') {
            Some(pos) => pieces.push(Piece::at(pos)),
            None => continue,
        }
    }

    debug!(count = pieces.len(), "Decoded snapshot");
    Ok(pieces)
}
