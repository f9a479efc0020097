use chess::{PieceColor, Position, ResultSet};
use tokio::sync::{mpsc, oneshot};

use crate::error::EngineError;

pub(crate) type AnalysisReply = oneshot::Sender<Result<ResultSet, EngineError>>;

/// Commands sent to the engine actor. Each embeds a oneshot for the reply.
pub(crate) enum EngineCommand {
    Analyze { search: Search },
    Stop { reply: oneshot::Sender<()> },
    Destroy { reply: oneshot::Sender<()> },
}

/// One analysis request and everything it has accumulated so far.
pub(crate) struct Search {
    pub fen: String,
    pub side_to_move: PieceColor,
    pub depth: u32,
    pub results: ResultSet,
    progress: mpsc::Sender<ResultSet>,
    reply: AnalysisReply,
}

impl Search {
    pub fn new(
        position: &Position,
        depth: u32,
        progress: mpsc::Sender<ResultSet>,
        reply: AnalysisReply,
    ) -> Self {
        Self {
            fen: position.to_fen(),
            side_to_move: position.side_to_move,
            depth: depth.max(1),
            results: ResultSet::new(),
            progress,
            reply,
        }
    }

    /// Push a snapshot without waiting; a full channel drops it.
    pub fn publish(&self) {
        let _ = self.progress.try_send(self.results.clone());
    }

    /// Resolve with whatever has been gathered.
    pub fn finish(self) {
        let _ = self.reply.send(Ok(self.results));
    }

    pub fn fail(self, err: EngineError) {
        let _ = self.reply.send(Err(err));
    }
}
