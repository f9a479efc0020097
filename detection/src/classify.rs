//! Turn per-square classifier output into a [`DetectionResult`].

use std::collections::BTreeMap;

use chess::{Board, CastlingRight, CastlingRights, Piece, PieceColor, PieceKind, Position, Square};
use serde::{Deserialize, Serialize};

use crate::config::LOW_CONFIDENCE_CUTOFF;
use crate::error::DetectionError;
use crate::result::{check_confidence, DetectionResult};

/// Classifier verdict for one square: `"empty"` or colour + piece
/// (`"wp"`, `"bk"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class: String,
    pub confidence: f32,
}

/// Which side of the board was nearest the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// White at the bottom: the first square read is a8.
    #[default]
    Standard,
    /// Black at the bottom: the first square read is h1.
    Flipped,
}

fn parse_class(class: &str) -> Result<Option<Piece>, DetectionError> {
    if class == "empty" {
        return Ok(None);
    }
    let mut chars = class.chars();
    let color = match chars.next() {
        Some('w') => PieceColor::White,
        Some('b') => PieceColor::Black,
        _ => return Err(DetectionError::UnknownClass(class.to_string())),
    };
    let kind = chars
        .next()
        .and_then(PieceKind::from_char)
        .filter(|_| chars.next().is_none())
        .ok_or_else(|| DetectionError::UnknownClass(class.to_string()))?;
    Ok(Some(Piece::new(kind, color)))
}

/// Square of the `index`-th classification in reading order.
fn square_at(index: usize, orientation: Orientation) -> Option<Square> {
    let index = match orientation {
        Orientation::Standard => index,
        Orientation::Flipped => 63usize.checked_sub(index)?,
    };
    let rank = 7 - (index / 8) as u8;
    let file = (index % 8) as u8;
    Square::new(file, rank)
}

/// Castling rights implied by kings and rooks standing on their home squares.
fn guess_castling(board: &Board) -> CastlingRights {
    let mut rights = CastlingRights::NONE;
    let home = |name: &str, kind: PieceKind, color: PieceColor| {
        name.parse::<Square>()
            .ok()
            .and_then(|sq| board.piece_on(sq))
            == Some(Piece::new(kind, color))
    };

    for (color, king, kingside_rook, queenside_rook, kingside, queenside) in [
        (
            PieceColor::White,
            "e1",
            "h1",
            "a1",
            CastlingRight::WhiteKingside,
            CastlingRight::WhiteQueenside,
        ),
        (
            PieceColor::Black,
            "e8",
            "h8",
            "a8",
            CastlingRight::BlackKingside,
            CastlingRight::BlackQueenside,
        ),
    ] {
        if !home(king, PieceKind::King, color) {
            continue;
        }
        if home(kingside_rook, PieceKind::Rook, color) {
            rights.insert(kingside);
        }
        if home(queenside_rook, PieceKind::Rook, color) {
            rights.insert(queenside);
        }
    }
    rights
}

/// Build a detection result from 64 classifications in reading order.
///
/// White is assumed to move. Castling rights are inferred from home squares,
/// overall confidence is the mean, and squares under the review cutoff are
/// listed. `needs_review` is set when any square is doubtful or the
/// position audit finds problems.
pub fn classifications_to_detection(
    classifications: &[Classification],
    orientation: Orientation,
) -> Result<DetectionResult, DetectionError> {
    if classifications.len() != 64 {
        return Err(DetectionError::WrongSquareCount(classifications.len()));
    }

    let mut board = Board::empty();
    let mut square_confidences = BTreeMap::new();
    for (i, c) in classifications.iter().enumerate() {
        let square = square_at(i, orientation).ok_or(DetectionError::WrongSquareCount(i))?;
        board.set(square, parse_class(&c.class)?);
        square_confidences.insert(square, check_confidence(c.confidence)?);
    }

    let position = Position {
        board,
        side_to_move: PieceColor::White,
        castling: guess_castling(&board),
        en_passant: None,
        halfmove_clock: 0,
        fullmove_number: 1,
    };

    let confidence =
        classifications.iter().map(|c| c.confidence).sum::<f32>() / classifications.len() as f32;

    // Listed a8..h1 whatever the orientation.
    let low_confidence_squares: Vec<Square> = (0..64)
        .filter_map(|i| square_at(i, Orientation::Standard))
        .filter(|sq| {
            square_confidences
                .get(sq)
                .is_some_and(|c| *c < LOW_CONFIDENCE_CUTOFF)
        })
        .collect();

    let validation_errors = position.audit();
    let needs_review = !low_confidence_squares.is_empty() || !validation_errors.is_empty();

    tracing::debug!(
        fen = %position,
        confidence,
        doubtful = low_confidence_squares.len(),
        "Classifications converted"
    );

    Ok(DetectionResult {
        fen: position.to_fen(),
        confidence,
        square_confidences,
        low_confidence_squares,
        validation_errors,
        needs_review,
        processing_time_ms: None,
    })
}
