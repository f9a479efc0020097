//! Field-level codec for position literals (FEN).

use smallvec::SmallVec;

use crate::position::PositionError;
use crate::types::{PieceColor, Square};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Defaults used to back-fill a literal that stops after the placement field
/// (or any later field), in field order.
const FIELD_DEFAULTS: [&str; 5] = ["w", "-", "-", "0", "1"];

/// The six whitespace-separated fields of a literal, with missing trailing
/// fields back-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenFields<'a> {
    pub placement: &'a str,
    pub side_to_move: &'a str,
    pub castling: &'a str,
    pub en_passant: &'a str,
    pub halfmove_clock: &'a str,
    pub fullmove_number: &'a str,
}

pub fn split_fields(text: &str) -> Result<FenFields<'_>, PositionError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.is_empty() {
        return Err(PositionError::Empty);
    }
    if parts.len() > 6 {
        return Err(PositionError::TooManyFields(parts.len()));
    }

    let field = |i: usize| parts.get(i).copied().unwrap_or(FIELD_DEFAULTS[i - 1]);
    Ok(FenFields {
        placement: parts[0],
        side_to_move: field(1),
        castling: field(2),
        en_passant: field(3),
        halfmove_clock: field(4),
        fullmove_number: field(5),
    })
}

pub fn parse_side_to_move(s: &str) -> Result<PieceColor, PositionError> {
    match s {
        "w" => Ok(PieceColor::White),
        "b" => Ok(PieceColor::Black),
        other => Err(PositionError::InvalidSideToMove(other.to_string())),
    }
}

pub fn parse_en_passant(s: &str) -> Result<Option<Square>, PositionError> {
    if s == "-" {
        return Ok(None);
    }
    let square: Square = s
        .parse()
        .map_err(|_| PositionError::InvalidEnPassant(s.to_string()))?;
    // Target squares only ever sit behind a pawn that just advanced two ranks.
    if square.rank() != 2 && square.rank() != 5 {
        return Err(PositionError::InvalidEnPassant(s.to_string()));
    }
    Ok(Some(square))
}

pub fn format_en_passant(square: Option<Square>) -> String {
    square.map_or_else(|| "-".to_string(), |sq| sq.to_string())
}

pub fn parse_counter(field: &'static str, s: &str) -> Result<u32, PositionError> {
    s.parse().map_err(|_| PositionError::InvalidCounter {
        field,
        value: s.to_string(),
    })
}

/// One of the four castling flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastlingRight {
    WhiteKingside,
    WhiteQueenside,
    BlackKingside,
    BlackQueenside,
}

impl CastlingRight {
    /// Canonical serialisation order.
    pub const ALL: [CastlingRight; 4] = [
        Self::WhiteKingside,
        Self::WhiteQueenside,
        Self::BlackKingside,
        Self::BlackQueenside,
    ];

    pub fn symbol(self) -> char {
        match self {
            Self::WhiteKingside => 'K',
            Self::WhiteQueenside => 'Q',
            Self::BlackKingside => 'k',
            Self::BlackQueenside => 'q',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'K' => Some(Self::WhiteKingside),
            'Q' => Some(Self::WhiteQueenside),
            'k' => Some(Self::BlackKingside),
            'q' => Some(Self::BlackQueenside),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::WhiteKingside => 0b0001,
            Self::WhiteQueenside => 0b0010,
            Self::BlackKingside => 0b0100,
            Self::BlackQueenside => 0b1000,
        }
    }
}

/// Subset of `{K, Q, k, q}`. Order of the input text is irrelevant; output
/// is always `KQkq` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    pub fn parse(s: &str) -> Result<Self, PositionError> {
        if s == "-" {
            return Ok(Self::NONE);
        }
        let mut rights = Self::NONE;
        for c in s.chars() {
            let right = CastlingRight::from_symbol(c)
                .ok_or_else(|| PositionError::InvalidCastling(s.to_string()))?;
            if rights.contains(right) {
                return Err(PositionError::InvalidCastling(s.to_string()));
            }
            rights.insert(right);
        }
        Ok(rights)
    }

    pub fn contains(self, right: CastlingRight) -> bool {
        self.0 & right.bit() != 0
    }

    pub fn insert(&mut self, right: CastlingRight) {
        self.0 |= right.bit();
    }

    pub fn remove(&mut self, right: CastlingRight) {
        self.0 &= !right.bit();
    }

    pub fn toggle(&mut self, right: CastlingRight) {
        self.0 ^= right.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn flags(self) -> SmallVec<[CastlingRight; 4]> {
        CastlingRight::ALL
            .into_iter()
            .filter(|r| self.contains(*r))
            .collect()
    }
}

impl std::fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for right in self.flags() {
            write!(f, "{}", right.symbol())?;
        }
        Ok(())
    }
}
