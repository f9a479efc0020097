use std::collections::BTreeMap;
use std::path::Path;

use chess::{Position, Square};
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// Candidate position returned by a detection service.
///
/// The literal is unconfirmed: it may lack a king or carry misread pieces
/// until a person reviews it through [`crate::DetectionBridge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub fen: String,
    /// Overall confidence in `0..=1`.
    pub confidence: f32,
    #[serde(default)]
    pub square_confidences: BTreeMap<Square, f32>,
    #[serde(default)]
    pub low_confidence_squares: Vec<Square>,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

/// `value` unchanged if it lies in `0..=1`. NaN is rejected.
pub(crate) fn check_confidence(value: f32) -> Result<f32, DetectionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DetectionError::InvalidConfidence(value))
    }
}

impl DetectionResult {
    pub fn from_json(text: &str) -> Result<Self, DetectionError> {
        let result: Self = serde_json::from_str(text)?;
        result.validate()?;
        Ok(result)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DetectionError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Every confidence, overall and per square, must lie in `0..=1`.
    pub fn validate(&self) -> Result<(), DetectionError> {
        check_confidence(self.confidence)?;
        for value in self.square_confidences.values() {
            check_confidence(*value)?;
        }
        Ok(())
    }

    /// The candidate position, checked for shape only.
    pub fn position(&self) -> Result<Position, DetectionError> {
        Ok(Position::parse_unvalidated(&self.fen)?)
    }

    pub fn square_confidence(&self, square: Square) -> Option<f32> {
        self.square_confidences.get(&square).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RESPONSE: &str = r#"{
        "fen": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1",
        "confidence": 0.93,
        "square_confidences": {"e4": 0.71, "e2": 0.98},
        "low_confidence_squares": ["e4"],
        "needs_review": true,
        "validation_errors": [],
        "processing_time_ms": 412
    }"#;

    #[test]
    fn test_parse_service_response() {
        let result = DetectionResult::from_json(RESPONSE).unwrap();
        let e4: Square = "e4".parse().unwrap();
        assert_eq!(result.low_confidence_squares, vec![e4]);
        assert_eq!(result.square_confidence(e4), Some(0.71));
        assert!(result.needs_review);
        assert_eq!(result.processing_time_ms, Some(412));
        assert_eq!(result.position().unwrap().to_fen(), result.fen);
    }

    #[test]
    fn test_optional_fields_default() {
        let result =
            DetectionResult::from_json(r#"{"fen": "8/8/8/8/8/8/8/8", "confidence": 0.2}"#).unwrap();
        assert!(result.square_confidences.is_empty());
        assert!(!result.needs_review);
        assert_eq!(result.position().unwrap().defects().len(), 2);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RESPONSE.as_bytes()).unwrap();
        let result = DetectionResult::from_json_file(file.path()).unwrap();
        assert_eq!(result.confidence, 0.93);
    }

    #[test]
    fn test_bad_square_key_is_rejected() {
        let err = DetectionResult::from_json(
            r#"{"fen": "8/8/8/8/8/8/8/8", "confidence": 0.2, "square_confidences": {"z9": 0.1}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DetectionError::Json(_)));
    }

    #[test]
    fn test_unreadable_fen() {
        let result = DetectionResult::from_json(r#"{"fen": "8/8/8", "confidence": 0.99}"#).unwrap();
        assert!(matches!(result.position(), Err(DetectionError::Position(_))));
    }

    #[test]
    fn test_confidence_out_of_range_is_rejected() {
        let err = DetectionResult::from_json(r#"{"fen": "8/8/8/8/8/8/8/8", "confidence": 1.4}"#)
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidConfidence(c) if c == 1.4));

        let err = DetectionResult::from_json(
            r#"{"fen": "8/8/8/8/8/8/8/8", "confidence": 0.5, "square_confidences": {"e4": -0.1}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidConfidence(_)));

        assert!(check_confidence(f32::NAN).is_err());
        assert_eq!(check_confidence(0.0).unwrap(), 0.0);
        assert_eq!(check_confidence(1.0).unwrap(), 1.0);
    }
}
