//! Position snapshots: placement plus the five metadata fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::board::Board;
use crate::fen::{self, CastlingRights, STARTING_FEN};
use crate::types::{PieceColor, PieceKind, Square};

/// A full board state. Cloning produces an independent snapshot.
///
/// A `Position` is always structurally well-formed (8 × 8 cells, parseable
/// fields) but is not necessarily playable: square edits can remove a king.
/// [`Position::validate`] reports such defects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub board: Board,
    pub side_to_move: PieceColor,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("empty position literal")]
    Empty,
    #[error("expected at most 6 fields, found {0}")]
    TooManyFields(usize),
    #[error("expected 8 ranks, found {0}")]
    WrongRankCount(usize),
    #[error("rank {rank} has {count} squares, expected 8")]
    WrongSquareCount { rank: u8, count: usize },
    #[error("invalid piece symbol '{0}'")]
    InvalidPiece(char),
    #[error("expected 1 {color} king, found {count}")]
    KingCount { color: PieceColor, count: usize },
    #[error("pawn on back rank: {0}")]
    PawnOnBackRank(Square),
    #[error("invalid side to move '{0}'")]
    InvalidSideToMove(String),
    #[error("invalid castling rights '{0}'")]
    InvalidCastling(String),
    #[error("invalid en passant square '{0}'")]
    InvalidEnPassant(String),
    #[error("invalid {field} '{value}'")]
    InvalidCounter { field: &'static str, value: String },
}

impl Position {
    pub fn starting() -> Self {
        Self {
            board: Board::starting(),
            side_to_move: PieceColor::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parse a literal, checking shape and field syntax only.
    ///
    /// Detection results and in-progress edits go through this path, since
    /// they may legitimately lack a king until corrected.
    pub fn parse_unvalidated(text: &str) -> Result<Self, PositionError> {
        let fields = fen::split_fields(text)?;
        Ok(Self {
            board: Board::from_placement(fields.placement)?,
            side_to_move: fen::parse_side_to_move(fields.side_to_move)?,
            castling: CastlingRights::parse(fields.castling)?,
            en_passant: fen::parse_en_passant(fields.en_passant)?,
            halfmove_clock: fen::parse_counter("halfmove clock", fields.halfmove_clock)?,
            fullmove_number: fen::parse_counter("fullmove number", fields.fullmove_number)?,
        })
    }

    /// First placement defect, if any.
    pub fn validate(&self) -> Result<(), PositionError> {
        match self.defects().into_iter().next() {
            Some(defect) => Err(defect),
            None => Ok(()),
        }
    }

    /// Every placement defect: king counts, then pawns on the first or last
    /// rank (a1..h1, then a8..h8).
    pub fn defects(&self) -> Vec<PositionError> {
        let mut defects = Vec::new();

        for color in [PieceColor::White, PieceColor::Black] {
            let count = self.board.kings(color).len();
            if count != 1 {
                defects.push(PositionError::KingCount { color, count });
            }
        }

        for rank in [0u8, 7] {
            for file in 0..8u8 {
                let Some(square) = Square::new(file, rank) else {
                    continue;
                };
                if self.board.piece_on(square).map(|p| p.kind) == Some(PieceKind::Pawn) {
                    defects.push(PositionError::PawnOnBackRank(square));
                }
            }
        }

        defects
    }

    /// Human-readable findings for review flows: the placement defects plus
    /// material counts no legal game can reach.
    pub fn audit(&self) -> Vec<String> {
        let mut findings: Vec<String> = self.defects().iter().map(|d| d.to_string()).collect();

        for color in [PieceColor::White, PieceColor::Black] {
            let pawns = self.board.count(PieceKind::Pawn, color);
            if pawns > 8 {
                findings.push(format!("{} has {} pawns (max 8)", color, pawns));
            }
            let total = self.board.count_color(color);
            if total > 16 {
                findings.push(format!("{} has {} pieces (max 16)", color, total));
            }
        }

        findings
    }

    pub fn is_valid(&self) -> bool {
        self.defects().is_empty()
    }

    /// Serialise to the six-field literal.
    pub fn to_fen(&self) -> String {
        self.to_string()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl FromStr for Position {
    type Err = PositionError;

    /// Parse and validate. Missing trailing fields are back-filled.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let position = Self::parse_unvalidated(s)?;
        position.validate()?;
        Ok(position)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.board.to_placement(),
            self.side_to_move.fen_char(),
            self.castling,
            fen::format_en_passant(self.en_passant),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_unvalidated(&s).map_err(serde::de::Error::custom)
    }
}
