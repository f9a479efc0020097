//! The live, editable position.
//!
//! `PositionModel` is the only place board text is produced from edits;
//! callers never splice literal strings themselves.

use crate::fen::CastlingRight;
use crate::position::{Position, PositionError};
use crate::types::{Piece, PieceColor, Square};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionModel {
    position: Position,
}

impl PositionModel {
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Independent copy for history entries and analysis requests.
    pub fn snapshot(&self) -> Position {
        self.position.clone()
    }

    pub fn literal(&self) -> String {
        self.position.to_string()
    }

    /// Replace the position from a literal. Partial literals are back-filled
    /// with `w - - 0 1`. On error the model is left untouched.
    pub fn set_from_literal(&mut self, text: &str) -> Result<&Position, PositionError> {
        let position: Position = text.parse()?;
        self.position = position;
        Ok(&self.position)
    }

    /// Replace the position wholesale (history navigation, detection seeds).
    pub fn replace(&mut self, position: Position) {
        self.position = position;
    }

    /// Edit one cell. Never fails; king counts are not re-checked here.
    pub fn set_square(&mut self, square: Square, piece: Option<Piece>) -> Option<Piece> {
        self.position.board.set(square, piece)
    }

    pub fn toggle_castling_right(&mut self, right: CastlingRight) {
        self.position.castling.toggle(right);
    }

    pub fn set_side_to_move(&mut self, color: PieceColor) {
        self.position.side_to_move = color;
    }

    pub fn set_en_passant(&mut self, square: Option<Square>) {
        self.position.en_passant = square;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PieceKind;

    #[test]
    fn literal_errors_leave_model_untouched() {
        let mut model = PositionModel::default();
        let before = model.snapshot();
        assert!(model.set_from_literal("8/8/8").is_err());
        assert_eq!(model.position(), &before);
    }

    #[test]
    fn removing_the_white_king_fails_revalidation() {
        let mut model = PositionModel::default();
        let e1: Square = "e1".parse().unwrap();
        let removed = model.set_square(e1, None);
        assert_eq!(removed, Some(Piece::new(PieceKind::King, PieceColor::White)));

        let literal = model.literal();
        assert_eq!(
            literal,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w KQkq - 0 1"
        );
        let err = model.set_from_literal(&literal).unwrap_err();
        assert_eq!(
            err,
            PositionError::KingCount {
                color: PieceColor::White,
                count: 0
            }
        );
    }

    #[test]
    fn field_edits_serialise_canonically() {
        let mut model = PositionModel::default();
        model.toggle_castling_right(CastlingRight::WhiteKingside);
        model.toggle_castling_right(CastlingRight::BlackQueenside);
        model.set_side_to_move(PieceColor::Black);
        assert!(model.literal().ends_with(" b Qk - 0 1"));
        model.toggle_castling_right(CastlingRight::WhiteKingside);
        assert!(model.literal().ends_with(" b KQk - 0 1"));
    }

    #[test]
    fn snapshots_are_independent() {
        let mut model = PositionModel::default();
        let before = model.snapshot();
        model.set_square("d1".parse().unwrap(), None);
        assert_ne!(model.position(), &before);
        assert_eq!(before, Position::starting());
    }
}
