//! Confidence gate between a detection result and the live position.

use chess::{Piece, PieceColor, Position, PositionModel, Square};

use crate::error::{DetectionError, DetectionRejected};
use crate::result::DetectionResult;

/// Holds a detected position until it is accepted.
///
/// Corrections edit the pending position in place. Acceptance hands back a
/// validated copy; the bridge itself never touches session state.
#[derive(Debug, Clone)]
pub struct DetectionBridge {
    result: DetectionResult,
    pending: PositionModel,
    threshold: f32,
    corrected: bool,
    doubtful: Vec<Square>,
}

impl DetectionBridge {
    pub fn new(result: DetectionResult, threshold: f32) -> Result<Self, DetectionError> {
        result.validate()?;
        let pending = PositionModel::new(result.position()?);
        let doubtful = result.low_confidence_squares.clone();
        tracing::info!(
            confidence = result.confidence,
            threshold,
            doubtful = doubtful.len(),
            "Detection pending review"
        );
        Ok(Self {
            result,
            pending,
            threshold,
            corrected: false,
            doubtful,
        })
    }

    pub fn result(&self) -> &DetectionResult {
        &self.result
    }

    pub fn pending(&self) -> &Position {
        self.pending.position()
    }

    pub fn confidence(&self) -> f32 {
        self.result.confidence
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_corrected(&self) -> bool {
        self.corrected
    }

    /// Squares still awaiting review. Corrected squares drop out.
    pub fn low_confidence_squares(&self) -> &[Square] {
        &self.doubtful
    }

    /// Problems with the pending position: the service's report until the
    /// first correction, then a fresh audit.
    pub fn validation_errors(&self) -> Vec<String> {
        if self.corrected {
            self.pending.position().audit()
        } else {
            self.result.validation_errors.clone()
        }
    }

    pub fn correct_square(&mut self, square: Square, piece: Option<Piece>) {
        self.pending.set_square(square, piece);
        self.doubtful.retain(|sq| *sq != square);
        self.corrected = true;
        tracing::debug!(%square, ?piece, "Detection corrected");
    }

    pub fn correct_side_to_move(&mut self, color: PieceColor) {
        self.pending.set_side_to_move(color);
        self.corrected = true;
    }

    /// Confirm the pending position.
    ///
    /// Accepted when confidence meets the threshold with no validation
    /// errors, or when `override_review` is set. A position that fails
    /// structural validation (king counts, back-rank pawns) is rejected
    /// either way.
    pub fn accept(&self, override_review: bool) -> Result<Position, DetectionRejected> {
        let errors = self.validation_errors();
        let confident = self.confidence() >= self.threshold && errors.is_empty();

        let position = self.pending.snapshot();
        let structural: Vec<String> = position.defects().iter().map(|d| d.to_string()).collect();

        if !structural.is_empty() {
            return Err(self.rejection(structural));
        }
        if !(confident || override_review) {
            let mut reasons = errors;
            if self.confidence() < self.threshold {
                reasons.insert(
                    0,
                    format!(
                        "confidence {:.2} below threshold {:.2}",
                        self.confidence(),
                        self.threshold
                    ),
                );
            }
            return Err(self.rejection(reasons));
        }

        tracing::info!(fen = %position, override_review, "Detection accepted");
        Ok(position)
    }

    fn rejection(&self, reasons: Vec<String>) -> DetectionRejected {
        tracing::info!(?reasons, "Detection rejected");
        DetectionRejected {
            confidence: self.confidence(),
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::PieceKind;

    fn result(fen: &str, confidence: f32, errors: &[&str], doubtful: &[&str]) -> DetectionResult {
        DetectionResult {
            fen: fen.to_string(),
            confidence,
            square_confidences: Default::default(),
            low_confidence_squares: doubtful.iter().map(|s| s.parse().unwrap()).collect(),
            validation_errors: errors.iter().map(|s| s.to_string()).collect(),
            needs_review: !errors.is_empty() || !doubtful.is_empty(),
            processing_time_ms: None,
        }
    }

    const NO_WHITE_KING: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w kq - 0 1";

    #[test]
    fn test_confident_detection_is_accepted() {
        let bridge =
            DetectionBridge::new(result(chess::STARTING_FEN, 0.97, &[], &[]), 0.9).unwrap();
        assert_eq!(bridge.accept(false).unwrap(), Position::starting());
    }

    #[test]
    fn test_low_confidence_with_errors_is_rejected() {
        let bridge = DetectionBridge::new(
            result(NO_WHITE_KING, 0.5, &["expected 1 white king, found 0"], &["e1"]),
            0.9,
        )
        .unwrap();
        let err = bridge.accept(false).unwrap_err();
        assert_eq!(err.confidence, 0.5);
        assert!(err
            .reasons
            .contains(&"expected 1 white king, found 0".to_string()));
        assert_eq!(bridge.pending().to_fen(), NO_WHITE_KING);
    }

    #[test]
    fn test_override_cannot_skip_structural_checks() {
        let bridge = DetectionBridge::new(result(NO_WHITE_KING, 0.5, &[], &[]), 0.9).unwrap();
        assert!(bridge.accept(true).is_err());
    }

    #[test]
    fn test_correction_then_override() {
        let mut bridge = DetectionBridge::new(
            result(NO_WHITE_KING, 0.5, &["expected 1 white king, found 0"], &["e1", "d7"]),
            0.9,
        )
        .unwrap();
        let e1: Square = "e1".parse().unwrap();
        bridge.correct_square(e1, Some(Piece::new(PieceKind::King, PieceColor::White)));

        assert!(bridge.is_corrected());
        assert_eq!(bridge.low_confidence_squares(), &["d7".parse::<Square>().unwrap()]);
        assert!(bridge.validation_errors().is_empty());

        // Still below threshold.
        assert!(bridge.accept(false).is_err());
        let accepted = bridge.accept(true).unwrap();
        assert_eq!(accepted.board, Position::starting().board);
    }

    #[test]
    fn test_advisory_errors_block_confident_results() {
        let fen = "4k3/pppppppp/p7/8/8/8/8/4K3 w - - 0 1";
        let bridge =
            DetectionBridge::new(result(fen, 0.99, &["black has 9 pawns (max 8)"], &[]), 0.9)
                .unwrap();
        assert!(bridge.accept(false).is_err());
        assert!(bridge.accept(true).is_ok());
    }

    #[test]
    fn test_unreadable_literal_is_an_error() {
        assert!(matches!(
            DetectionBridge::new(result("8/8/8", 0.99, &[], &[]), 0.9),
            Err(DetectionError::Position(_))
        ));
    }

    #[test]
    fn test_out_of_range_confidence_is_an_error() {
        assert!(matches!(
            DetectionBridge::new(result(chess::STARTING_FEN, 3.0, &[], &[]), 0.9),
            Err(DetectionError::InvalidConfidence(_))
        ));

        let mut bad_square = result(chess::STARTING_FEN, 0.95, &[], &[]);
        bad_square
            .square_confidences
            .insert("e2".parse().unwrap(), f32::NAN);
        assert!(matches!(
            DetectionBridge::new(bad_square, 0.9),
            Err(DetectionError::InvalidConfidence(_))
        ));
    }
}
