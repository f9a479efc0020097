//! Detection service abstraction.

use std::path::Path;

use async_trait::async_trait;

use crate::error::DetectionError;
use crate::result::DetectionResult;

/// Image-to-position detection, implemented outside this workspace.
#[async_trait]
pub trait DetectionService: Send + Sync {
    /// Detect a position in an encoded image.
    async fn detect(&self, image: &[u8]) -> Result<DetectionResult, DetectionError>;
}

/// Replays a saved service response regardless of the image.
#[derive(Debug, Clone)]
pub struct RecordedDetection {
    result: DetectionResult,
}

impl RecordedDetection {
    pub fn new(result: DetectionResult) -> Self {
        Self { result }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DetectionError> {
        Ok(Self::new(DetectionResult::from_json_file(path)?))
    }
}

#[async_trait]
impl DetectionService for RecordedDetection {
    async fn detect(&self, image: &[u8]) -> Result<DetectionResult, DetectionError> {
        tracing::debug!(bytes = image.len(), "Replaying recorded detection");
        Ok(self.result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recorded_detection_replays() {
        let result = DetectionResult::from_json(
            r#"{"fen": "4k3/8/8/8/8/8/8/4K3 w - - 0 1", "confidence": 0.8}"#,
        )
        .unwrap();
        let service: Box<dyn DetectionService> = Box::new(RecordedDetection::new(result.clone()));
        assert_eq!(service.detect(b"not really a png").await.unwrap(), result);
    }
}
