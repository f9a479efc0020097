//! Read-only view of a session for presentation layers.

use chess::{HistoryEntry, PieceColor, ResultSet, Square};
use serde::Serialize;
use uuid::Uuid;

use crate::state::Mode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub san: String,
    pub uci: String,
    pub fen: String,
}

impl From<&HistoryEntry> for MoveRecord {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            san: entry.san.clone(),
            uci: entry.uci.clone(),
            fen: entry.position.to_fen(),
        }
    }
}

/// Everything a front end needs to draw the session and enable controls.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub mode: Mode,
    pub fen: String,
    pub side_to_move: PieceColor,
    /// Placement defects of the shown position; empty when playable.
    pub defects: Vec<String>,
    pub ply: usize,
    pub history: Vec<MoveRecord>,
    pub cursor: Option<usize>,
    pub selected: Option<Square>,
    pub analysis: Option<ResultSet>,
    pub engine_ready: bool,
}

impl SessionSnapshot {
    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn can_analyze(&self) -> bool {
        self.engine_ready && self.is_valid()
    }

    pub fn can_apply_moves(&self) -> bool {
        self.mode == Mode::Playing
    }

    pub fn can_edit(&self) -> bool {
        self.mode != Mode::Viewing
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
