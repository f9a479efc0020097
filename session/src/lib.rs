//! Session coordination: the Viewing/Playing/Editing machine over one
//! position and its history, plus the engine, detection and explanation
//! collaborators attached to it.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod explain;
pub mod snapshot;
pub mod state;

pub use config::SessionConfig;
pub use coordinator::{AnalysisSession, AnalysisTicket};
pub use error::SessionError;
pub use explain::{
    CandidateMove, ExplanationCache, ExplanationError, ExplanationRequest, ExplanationResponse,
    ExplanationService,
};
pub use snapshot::{MoveRecord, SessionSnapshot};
pub use state::{Mode, SessionState};
