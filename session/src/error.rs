use chess::{PositionError, RulesError};
use detection::{DetectionError, DetectionRejected};
use engine::EngineError;

use crate::explain::ExplanationError;
use crate::state::Mode;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid position: {0}")]
    InvalidPosition(#[from] PositionError),
    #[error("Illegal move: {0}")]
    IllegalMove(#[from] RulesError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Engine not configured")]
    EngineNotConfigured,
    #[error(transparent)]
    DetectionRejected(#[from] DetectionRejected),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error("No detection pending")]
    NoPendingDetection,
    #[error("Cannot go from {from} to {to}")]
    InvalidTransition { from: Mode, to: Mode },
    #[error("Not allowed while {0}")]
    WrongMode(Mode),
    #[error("No analysis for the current position")]
    NoAnalysis,
    #[error("Explanation service not configured")]
    ExplanationNotConfigured,
    #[error(transparent)]
    Explanation(#[from] ExplanationError),
}
