pub mod analysis;
pub mod board;
pub mod fen;
pub mod history;
pub mod model;
pub mod moves;
pub mod position;
pub mod rules;
pub mod types;

pub use analysis::{AnalysisLine, ResultSet, Score, MATE_SCORE};
pub use board::Board;
pub use fen::{CastlingRight, CastlingRights, STARTING_FEN};
pub use history::{HistoryEntry, MoveHistory};
pub use model::PositionModel;
pub use moves::{Move, MoveParseError};
pub use position::{Position, PositionError};
pub use rules::{CozyRules, Rules, RulesError};
pub use types::{Piece, PieceColor, PieceKind, Square, SquareParseError};
