use thiserror::Error;

use super::SelectionSessionState;
use crate::session::SessionError;

/// Errors surfaced by the selection coordinator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// `begin_selection` while another session is open on the same visual
    #[error("selection session busy (state: {state})")]
    SessionBusy { state: SelectionSessionState },

    /// The engine rejected or timed out a commit; the selection is pending again
    #[error("commit failed: {0}")]
    CommitFailed(#[source] SessionError),

    /// The engine refused to open a selection scope
    #[error("could not open selection scope: {0}")]
    BeginFailed(#[source] SessionError),

    /// An operation arrived outside the state it is valid in.
    /// Public operations swallow this and report a no-op instead.
    #[error("stale interaction: {operation} while {state}")]
    StaleInteraction {
        operation: &'static str,
        state: SelectionSessionState,
    },

    /// The document behind the session is gone
    #[error("data session closed")]
    SessionClosed,
}

impl SelectionError {
    /// Map a transport failure, keeping the fatal case distinct
    pub(crate) fn from_session(error: SessionError, wrap: fn(SessionError) -> Self) -> Self {
        if error.is_fatal() {
            SelectionError::SessionClosed
        } else {
            wrap(error)
        }
    }
}
