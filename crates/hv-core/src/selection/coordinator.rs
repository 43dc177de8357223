//! Selection session coordinator

use std::sync::Arc;
use parking_lot::Mutex;

use super::{PendingSelection, SelectionError, SelectionSessionState, SelectionSnapshot};
use crate::events::events::{
    SelectionCancelled, SelectionCommitFailed, SelectionStarted, SelectionsConfirmed,
};
use crate::events::EventBus;
use crate::hypercube::ElementId;
use crate::session::{DataSession, SelectionPath, SessionError};

use SelectionSessionState::{Active, Cancelling, Committing, Idle};

/// Result of [`SelectionCoordinator::commit`]
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The engine acknowledged these values
    Committed { values: Vec<ElementId> },
    /// No session was active; nothing was sent
    Stale,
    /// A cancel overtook the commit and the engine did not apply it
    Superseded,
}

/// Result of [`SelectionCoordinator::cancel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Reverted,
    /// Nothing to cancel
    Stale,
}

/// What an outside click did
#[derive(Debug, Clone, PartialEq)]
pub enum OutsideClickOutcome {
    /// The dirty selection was committed
    Committed(CommitOutcome),
    /// A clean session was closed
    Closed,
    /// No session was active
    Ignored,
}

#[derive(Debug, Default)]
struct Inner {
    state: SelectionSessionState,
    path: Option<SelectionPath>,
    pending: PendingSelection,
    in_flight: Option<PendingSelection>,
    /// Whether the engine currently holds an open selection scope for us
    scope_open: bool,
    /// Bumped whenever a logical session ends; stale awaits compare against it
    cycle: u64,
    /// Bumped whenever a selection scope is requested on the engine
    begin_seq: u64,
    last_error: Option<String>,
}

impl Inner {
    fn reset(&mut self) {
        self.state = Idle;
        self.path = None;
        self.pending.clear();
        self.in_flight = None;
        self.scope_open = false;
        self.cycle += 1;
    }

    fn stale(&self, operation: &'static str) {
        let stale = SelectionError::StaleInteraction {
            operation,
            state: self.state,
        };
        tracing::debug!("Ignoring {}", stale);
    }
}

/// Coordinates one visual's brush interactions with a data session.
///
/// Operations are expected to be driven from a single event source. Only
/// `begin_selection`, `commit` and `cancel` suspend; `toggle` stays available
/// while a commit is outstanding and feeds a fresh pending selection.
pub struct SelectionCoordinator {
    session: Arc<dyn DataSession>,
    events: Arc<EventBus>,
    inner: Mutex<Inner>,
}

impl SelectionCoordinator {
    pub fn new(session: Arc<dyn DataSession>, events: Arc<EventBus>) -> Self {
        Self {
            session,
            events,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn session(&self) -> &Arc<dyn DataSession> {
        &self.session
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Register the "selections confirmed" observer
    pub fn on_confirmed<F>(&self, f: F)
    where
        F: FnMut(&SelectionsConfirmed) + Send + Sync + 'static,
    {
        self.events.on::<SelectionsConfirmed, _>(f);
    }

    pub fn state(&self) -> SelectionSessionState {
        self.inner.lock().state
    }

    /// Active with something pending
    pub fn is_dirty(&self) -> bool {
        let inner = self.inner.lock();
        inner.state == Active && !inner.pending.is_empty()
    }

    pub fn pending(&self) -> PendingSelection {
        self.inner.lock().pending.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        let inner = self.inner.lock();
        SelectionSnapshot {
            state: inner.state,
            pending: inner.pending.to_vec(),
            in_flight: inner.in_flight.as_ref().map(|p| p.to_vec()).unwrap_or_default(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Open a selection scope on `path`
    pub async fn begin_selection(&self, path: SelectionPath) -> Result<(), SelectionError> {
        let (cycle, token) = {
            let mut inner = self.inner.lock();
            if inner.state != Idle {
                return Err(SelectionError::SessionBusy { state: inner.state });
            }
            inner.state = Active;
            inner.path = Some(path.clone());
            inner.pending.clear();
            inner.scope_open = false;
            inner.begin_seq += 1;
            (inner.cycle, inner.begin_seq)
        };

        let result = self.session.begin_selections(std::slice::from_ref(&path)).await;

        let (superseded, reopened) = {
            let inner = self.inner.lock();
            (inner.cycle != cycle, inner.begin_seq != token)
        };
        if superseded {
            // Cancelled while the scope was being opened. A newer scope on the
            // same object must not be closed by this stale revert.
            if reopened {
                tracing::debug!("Stale begin on {} resolved after a newer scope opened", path);
            } else if result.is_ok() {
                if let Err(e) = self.session.end_selections(false).await {
                    tracing::warn!("Failed to close orphaned selection scope on {}: {}", path, e);
                }
            }
            return Ok(());
        }

        let mut inner = self.inner.lock();
        match result {
            Ok(()) => {
                inner.scope_open = true;
                inner.last_error = None;
                drop(inner);
                tracing::info!("Selection started on {} ({})", path, self.session.session_name());
                self.events.publish(SelectionStarted { path });
                Ok(())
            }
            Err(e) => {
                inner.reset();
                inner.last_error = Some(e.to_string());
                drop(inner);
                if e.is_fatal() {
                    tracing::error!("Data session {} closed", self.session.session_name());
                } else {
                    tracing::warn!("Could not begin selection on {}: {}", path, e);
                }
                Err(SelectionError::from_session(e, SelectionError::BeginFailed))
            }
        }
    }

    /// Flip `elem` in the pending selection. Returns false when swallowed as stale.
    pub fn toggle(&self, elem: ElementId) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            Active | Committing => {
                inner.pending.toggle(elem);
                true
            }
            _ => {
                inner.stale("toggle");
                false
            }
        }
    }

    /// Send the pending selection and confirm it
    pub async fn commit(&self) -> Result<CommitOutcome, SelectionError> {
        let (path, submitted, reopen, cycle) = {
            let mut inner = self.inner.lock();
            let path = match (inner.state, inner.path.clone()) {
                (Active, Some(path)) => path,
                _ => {
                    inner.stale("commit");
                    return Ok(CommitOutcome::Stale);
                }
            };
            let submitted = std::mem::take(&mut inner.pending);
            inner.in_flight = Some(submitted.clone());
            inner.state = Committing;
            let reopen = !inner.scope_open;
            if reopen {
                inner.begin_seq += 1;
            }
            (path, submitted, reopen, inner.cycle)
        };

        let values = submitted.to_vec();
        let result = self.send_commit(&path, &values, reopen, cycle).await;

        let mut inner = self.inner.lock();
        if inner.cycle != cycle {
            drop(inner);
            return match result {
                Ok(()) => {
                    // The engine applied the commit after the revert went out
                    tracing::info!(
                        "Commit of {} value(s) on {} acknowledged after cancel",
                        values.len(),
                        path
                    );
                    self.events.publish(SelectionsConfirmed {
                        path,
                        values: values.clone(),
                    });
                    Ok(CommitOutcome::Committed { values })
                }
                Err(e) => {
                    tracing::debug!("Commit on {} superseded by cancel: {}", path, e);
                    Ok(CommitOutcome::Superseded)
                }
            };
        }

        match result {
            Ok(()) => {
                inner.in_flight = None;
                inner.scope_open = false;
                inner.last_error = None;
                inner.cycle += 1;
                if inner.pending.is_empty() {
                    inner.state = Idle;
                    inner.path = None;
                } else {
                    // Toggles that arrived during the round-trip start the next session
                    inner.state = Active;
                }
                drop(inner);

                tracing::info!("Confirmed {} value(s) on {}", values.len(), path);
                self.events.publish(SelectionsConfirmed {
                    path,
                    values: values.clone(),
                });
                Ok(CommitOutcome::Committed { values })
            }
            Err(e) if e.is_fatal() => {
                inner.reset();
                inner.last_error = Some(e.to_string());
                drop(inner);
                tracing::error!("Data session {} closed during commit", self.session.session_name());
                Err(SelectionError::SessionClosed)
            }
            Err(e) => {
                let mut restored = inner.in_flight.take().unwrap_or_default();
                restored.apply(&inner.pending);
                inner.pending = restored;
                inner.state = Active;
                inner.last_error = Some(e.to_string());
                drop(inner);

                tracing::warn!("Commit on {} failed: {}", path, e);
                self.events.publish(SelectionCommitFailed {
                    path,
                    error: e.to_string(),
                });
                Err(SelectionError::CommitFailed(e))
            }
        }
    }

    async fn send_commit(
        &self,
        path: &SelectionPath,
        values: &[ElementId],
        reopen: bool,
        cycle: u64,
    ) -> Result<(), SessionError> {
        if reopen {
            self.session.begin_selections(std::slice::from_ref(path)).await?;
            let mut inner = self.inner.lock();
            if inner.cycle == cycle {
                inner.scope_open = true;
            }
        }

        if values.is_empty() {
            self.session.end_selections(true).await
        } else {
            self.session.select_and_confirm(path, values).await
        }
    }

    /// Revert the in-progress selection
    pub async fn cancel(&self) -> Result<CancelOutcome, SelectionError> {
        let (path, send_revert) = {
            let mut inner = self.inner.lock();
            match inner.state {
                Active | Committing => {
                    let send_revert = inner.scope_open || inner.in_flight.is_some();
                    inner.state = Cancelling;
                    inner.cycle += 1;
                    inner.pending.clear();
                    inner.in_flight = None;
                    (inner.path.clone(), send_revert)
                }
                _ => {
                    inner.stale("cancel");
                    return Ok(CancelOutcome::Stale);
                }
            }
        };

        let result = if send_revert {
            self.session.end_selections(false).await
        } else {
            Ok(())
        };

        let mut inner = self.inner.lock();
        inner.reset();
        match result {
            Ok(()) => inner.last_error = None,
            Err(e) if e.is_fatal() => {
                inner.last_error = Some(e.to_string());
                drop(inner);
                tracing::error!("Data session {} closed during cancel", self.session.session_name());
                return Err(SelectionError::SessionClosed);
            }
            Err(e) => {
                tracing::warn!("Revert failed: {}", e);
                inner.last_error = Some(e.to_string());
            }
        }
        drop(inner);

        if let Some(path) = path {
            tracing::info!("Selection cancelled on {}", path);
            self.events.publish(SelectionCancelled { path });
        }
        Ok(CancelOutcome::Reverted)
    }

    /// Pointer interaction outside the visual: confirm if dirty, close if clean
    pub async fn outside_interaction(&self) -> Result<OutsideClickOutcome, SelectionError> {
        let state = {
            let inner = self.inner.lock();
            if inner.state == Active && !inner.pending.is_empty() {
                None
            } else {
                Some(inner.state)
            }
        };

        match state {
            None => Ok(OutsideClickOutcome::Committed(self.commit().await?)),
            Some(Active) => {
                self.cancel().await?;
                Ok(OutsideClickOutcome::Closed)
            }
            Some(_) => Ok(OutsideClickOutcome::Ignored),
        }
    }
}
