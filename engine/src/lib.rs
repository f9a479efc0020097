//! UCI engine sessions: one subprocess per [`EngineSession`], driven by an
//! actor task and shared through cloneable handles.

mod actor;
mod commands;
pub mod config;
pub mod error;
pub mod session;
mod transport;
pub mod uci;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use error::EngineError;
pub use session::{EngineSession, EngineStatus, PendingAnalysis};
pub use uci::{parse_uci_message, InfoLine, UciCommand, UciError, UciMessage};
