//! Requests to the move explanation service, memoised per request.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chess::{Move, PieceColor, Position, ResultSet, Rules};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateMove {
    pub uci: String,
    pub san: String,
    pub score_cp: i32,
    pub mate_in: Option<i32>,
    pub pv: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub fen: String,
    pub side_to_move: PieceColor,
    pub moves: Vec<CandidateMove>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExplanationResponse {
    /// Text per candidate, in request order.
    pub explanations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExplanationError {
    #[error("Explanation service failed: {0}")]
    Service(String),
    #[error("Nothing to explain")]
    NoCandidates,
}

impl ExplanationRequest {
    /// Ranked candidates from `results`, best first. Lines whose first move
    /// is not legal in `position` are skipped.
    pub fn from_analysis(
        position: &Position,
        results: &ResultSet,
        rules: &dyn Rules,
    ) -> Result<Self, ExplanationError> {
        let moves: Vec<CandidateMove> = results
            .lines()
            .filter_map(|line| {
                let uci = line.best_move()?;
                let mv: Move = uci.parse().ok()?;
                let san = rules.to_san(position, mv).ok()?;
                Some(CandidateMove {
                    uci: uci.to_string(),
                    san,
                    score_cp: line.score_cp(),
                    mate_in: line.mate_in(),
                    pv: line.pv.clone(),
                })
            })
            .collect();

        if moves.is_empty() {
            return Err(ExplanationError::NoCandidates);
        }
        Ok(Self {
            fen: position.to_fen(),
            side_to_move: position.side_to_move,
            moves,
        })
    }
}

#[async_trait]
pub trait ExplanationService: Send + Sync {
    async fn explain(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationResponse, ExplanationError>;
}

/// Responses kept by [`ExplanationCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Default)]
struct Entries {
    responses: HashMap<ExplanationRequest, ExplanationResponse>,
    order: VecDeque<ExplanationRequest>,
}

/// Memoises an [`ExplanationService`]. Failures are not cached; once full,
/// the oldest response is evicted.
pub struct ExplanationCache {
    service: Arc<dyn ExplanationService>,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl ExplanationCache {
    pub fn new(service: Arc<dyn ExplanationService>) -> Self {
        Self::with_capacity(service, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(service: Arc<dyn ExplanationService>, capacity: usize) -> Self {
        Self {
            service,
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    pub async fn explain(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationResponse, ExplanationError> {
        if let Some(hit) = self.entries.lock().await.responses.get(request) {
            tracing::debug!(fen = %request.fen, "Explanation cache hit");
            return Ok(hit.clone());
        }

        let response = self.service.explain(request).await?;

        let mut entries = self.entries.lock().await;
        if entries
            .responses
            .insert(request.clone(), response.clone())
            .is_none()
        {
            entries.order.push_back(request.clone());
        }
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.responses.remove(&oldest);
            }
        }
        Ok(response)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.responses.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.responses.clear();
        entries.order.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chess::{AnalysisLine, CozyRules, Score};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub(crate) struct CountingService {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl ExplanationService for CountingService {
        async fn explain(
            &self,
            request: &ExplanationRequest,
        ) -> Result<ExplanationResponse, ExplanationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExplanationResponse {
                explanations: request
                    .moves
                    .iter()
                    .map(|m| format!("{} develops", m.san))
                    .collect(),
                opening: Some("Open Game".into()),
                tags: vec![],
            })
        }
    }

    fn line(rank: u32, pv: &[&str], score: Score) -> AnalysisLine {
        AnalysisLine {
            rank,
            depth: 12,
            seldepth: None,
            score,
            pv: pv.iter().map(|s| s.to_string()).collect(),
            nodes: None,
            nps: None,
            time_ms: None,
        }
    }

    fn sample_results() -> ResultSet {
        let mut results = ResultSet::new();
        results.record(line(1, &["g1f3", "g8f6"], Score::Centipawns(30)));
        results.record(line(2, &["e2e4"], Score::Centipawns(25)));
        results.record(line(3, &["e7e5"], Score::Centipawns(0)));
        results
    }

    #[test]
    fn test_request_from_analysis() {
        let request =
            ExplanationRequest::from_analysis(&Position::starting(), &sample_results(), &CozyRules)
                .unwrap();
        let sans: Vec<_> = request.moves.iter().map(|m| m.san.as_str()).collect();
        // e7e5 is not a white move and is dropped.
        assert_eq!(sans, ["Nf3", "e4"]);
        assert_eq!(request.moves[0].pv, ["g1f3", "g8f6"]);
        assert_eq!(request.side_to_move, PieceColor::White);
    }

    #[test]
    fn test_empty_analysis_has_nothing_to_explain() {
        assert!(matches!(
            ExplanationRequest::from_analysis(&Position::starting(), &ResultSet::new(), &CozyRules),
            Err(ExplanationError::NoCandidates)
        ));
    }

    #[tokio::test]
    async fn test_cache_memoises_by_request() {
        let service = Arc::new(CountingService::default());
        let cache = ExplanationCache::new(service.clone());
        let request =
            ExplanationRequest::from_analysis(&Position::starting(), &sample_results(), &CozyRules)
                .unwrap();

        let first = cache.explain(&request).await.unwrap();
        let second = cache.explain(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.explanations[0], "Nf3 develops");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        let mut other = request.clone();
        other.moves.truncate(1);
        cache.explain(&other).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_cache_evicts_oldest_when_full() {
        let service = Arc::new(CountingService::default());
        let cache = ExplanationCache::with_capacity(service.clone(), 1);
        let request =
            ExplanationRequest::from_analysis(&Position::starting(), &sample_results(), &CozyRules)
                .unwrap();
        let mut other = request.clone();
        other.moves.truncate(1);

        cache.explain(&request).await.unwrap();
        cache.explain(&other).await.unwrap();
        assert_eq!(cache.len().await, 1);

        cache.explain(&other).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        cache.explain(&request).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }
}
