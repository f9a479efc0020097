//! Detected-position intake: service responses, classifier conversion and
//! the review gate that confirms a position before it is analysed.

pub mod bridge;
pub mod classify;
pub mod config;
pub mod error;
pub mod result;
pub mod service;

pub use bridge::DetectionBridge;
pub use classify::{classifications_to_detection, Classification, Orientation};
pub use error::{DetectionError, DetectionRejected};
pub use result::DetectionResult;
pub use service::{DetectionService, RecordedDetection};
