//! One analysis session: live position, engine handle, pending detection and
//! explanation cache under a single owner.

use std::sync::Arc;

use chess::{Piece, PieceColor, Position, ResultSet, Square};
use detection::{DetectionBridge, DetectionResult, DetectionService};
use engine::{EngineSession, EngineStatus, PendingAnalysis};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::explain::{
    ExplanationCache, ExplanationRequest, ExplanationResponse, ExplanationService,
};
use crate::snapshot::SessionSnapshot;
use crate::state::SessionState;

/// An analysis in flight, tied to the position it was started on.
pub struct AnalysisTicket {
    pub position: Position,
    pub pending: PendingAnalysis,
}

pub struct AnalysisSession {
    id: Uuid,
    config: SessionConfig,
    state: SessionState,
    engine: Option<EngineSession>,
    detection: Option<DetectionBridge>,
    explanations: Option<ExplanationCache>,
}

impl AnalysisSession {
    pub fn new(position: Position, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(%id, fen = %position, "Session created");
        Self {
            id,
            config,
            state: SessionState::new(position),
            engine: None,
            detection: None,
            explanations: None,
        }
    }

    pub fn with_engine(mut self, engine: EngineSession) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_explanations(mut self, service: Arc<dyn ExplanationService>) -> Self {
        self.explanations = Some(ExplanationCache::new(service));
        self
    }

    /// Launch the configured engine binary and attach it.
    pub async fn start_engine(&mut self) -> Result<&EngineSession, SessionError> {
        let engine = EngineSession::start(self.config.engine.clone())
            .instrument(tracing::info_span!("session", id = %self.id))
            .await?;
        Ok(&*self.engine.insert(engine))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn engine(&self) -> Option<&EngineSession> {
        self.engine.as_ref()
    }

    pub fn engine_ready(&self) -> bool {
        self.engine
            .as_ref()
            .is_some_and(|e| e.status() != EngineStatus::Closed)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = self.state.snapshot();
        snapshot.session_id = Some(self.id);
        snapshot.engine_ready = self.engine_ready();
        snapshot
    }

    // Detection

    pub fn load_detection(
        &mut self,
        result: DetectionResult,
    ) -> Result<&DetectionBridge, SessionError> {
        let bridge = DetectionBridge::new(result, self.config.detection_threshold)?;
        Ok(&*self.detection.insert(bridge))
    }

    pub async fn detect_image(
        &mut self,
        service: &dyn DetectionService,
        image: &[u8],
    ) -> Result<&DetectionBridge, SessionError> {
        let result = service.detect(image).await?;
        self.load_detection(result)
    }

    pub fn pending_detection(&self) -> Option<&DetectionBridge> {
        self.detection.as_ref()
    }

    pub fn correct_detection_square(
        &mut self,
        square: Square,
        piece: Option<Piece>,
    ) -> Result<(), SessionError> {
        let bridge = self
            .detection
            .as_mut()
            .ok_or(SessionError::NoPendingDetection)?;
        bridge.correct_square(square, piece);
        Ok(())
    }

    pub fn correct_detection_side_to_move(
        &mut self,
        color: PieceColor,
    ) -> Result<(), SessionError> {
        let bridge = self
            .detection
            .as_mut()
            .ok_or(SessionError::NoPendingDetection)?;
        bridge.correct_side_to_move(color);
        Ok(())
    }

    /// Confirm the pending detection and make it the live position in
    /// Viewing mode. A rejection keeps the detection pending.
    pub fn accept_detection(&mut self, override_review: bool) -> Result<&Position, SessionError> {
        let bridge = self
            .detection
            .as_ref()
            .ok_or(SessionError::NoPendingDetection)?;
        let position = bridge.accept(override_review)?;
        self.detection = None;
        self.state.reset(position);
        Ok(self.state.position())
    }

    // Analysis

    /// Start analysing the live position at the configured depth.
    pub async fn start_analysis(&self) -> Result<AnalysisTicket, SessionError> {
        self.start_analysis_to(self.config.depth).await
    }

    pub async fn start_analysis_to(&self, depth: u32) -> Result<AnalysisTicket, SessionError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or(SessionError::EngineNotConfigured)?;
        let position = self.state.position().clone();
        position.validate()?;

        let pending = engine
            .start_analysis(&position, depth)
            .instrument(tracing::info_span!("session", id = %self.id))
            .await?;
        Ok(AnalysisTicket { position, pending })
    }

    /// Wait for `ticket` and cache its lines if the position is still shown.
    pub async fn finish_analysis(
        &mut self,
        ticket: AnalysisTicket,
    ) -> Result<ResultSet, SessionError> {
        let results = ticket.pending.finish().await?;
        self.state.record_analysis(&ticket.position, results.clone());
        Ok(results)
    }

    pub async fn analyze(&mut self) -> Result<ResultSet, SessionError> {
        let ticket = self.start_analysis().await?;
        self.finish_analysis(ticket).await
    }

    pub async fn stop_analysis(&self) -> Result<(), SessionError> {
        if let Some(engine) = &self.engine {
            engine.stop().await?;
        }
        Ok(())
    }

    /// Explain the cached analysis of the live position.
    pub async fn explain(&self) -> Result<ExplanationResponse, SessionError> {
        let cache = self
            .explanations
            .as_ref()
            .ok_or(SessionError::ExplanationNotConfigured)?;
        let results = self.state.analysis().ok_or(SessionError::NoAnalysis)?;
        let request =
            ExplanationRequest::from_analysis(self.state.position(), results, self.state.rules())?;
        Ok(cache.explain(&request).await?)
    }

    pub async fn shutdown(&mut self) -> Result<(), SessionError> {
        if let Some(engine) = self.engine.take() {
            engine.destroy().await?;
        }
        tracing::info!(id = %self.id, "Session closed");
        Ok(())
    }
}
