#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The subprocess could not be started, failed its handshake, exited, or
    /// the session was already closed. Fatal to the session.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl EngineError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::EngineUnavailable(reason.into())
    }
}
