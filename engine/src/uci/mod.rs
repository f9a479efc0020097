pub mod parser;

pub use parser::{parse_uci_message, InfoLine, UciCommand, UciMessage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciError {
    /// An `info` line without the fields a ranked line needs. Never fatal.
    #[error("Skipped info line: {0}")]
    SkippedInfo(String),
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
}
