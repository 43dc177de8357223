use thiserror::Error;

/// Failures reported by a [`DataSession`](super::DataSession)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The document was closed; the handle can never be used again
    #[error("session closed")]
    Closed,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

impl SessionError {
    /// Whether recovery is impossible
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Closed)
    }
}
