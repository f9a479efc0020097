use chess::PositionError;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed detection response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected 64 classifications, got {0}")]
    WrongSquareCount(usize),
    #[error("Unknown piece class '{0}'")]
    UnknownClass(String),
    #[error("Confidence {0} is outside 0..=1")]
    InvalidConfidence(f32),
    #[error("Detected position is unreadable: {0}")]
    Position(#[from] PositionError),
    #[error("Detection service failed: {0}")]
    Service(String),
}

/// A pending position was not confirmed. Carries what needs fixing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("detection rejected (confidence {confidence:.2}): {}", .reasons.join("; "))]
pub struct DetectionRejected {
    pub confidence: f32,
    pub reasons: Vec<String>,
}
