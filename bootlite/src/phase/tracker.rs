//! Phase completion tracking.

use bootlite_shared::errors::{BootError, BootResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Pending,
    Completed,
    /// The run aborted before this phase could complete.
    Failed,
}

struct TrackerInner {
    channels: HashMap<String, watch::Sender<PhaseState>>,
    /// Completed phase names, in completion order.
    completed: Mutex<Vec<String>>,
}

/// Per-run completion state of every configured phase.
///
/// Each phase has a watch channel, so any number of tasks can wait on it
/// and a phase completed before the wait starts is observed immediately.
#[derive(Clone)]
pub struct PhaseTracker {
    inner: Arc<TrackerInner>,
}

impl PhaseTracker {
    pub fn new<I, S>(phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let channels = phases
            .into_iter()
            .map(|name| (name.into(), watch::channel(PhaseState::Pending).0))
            .collect();
        Self {
            inner: Arc::new(TrackerInner {
                channels,
                completed: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self, phase: &str) -> Option<PhaseState> {
        self.inner.channels.get(phase).map(|tx| *tx.borrow())
    }

    pub fn is_completed(&self, phase: &str) -> bool {
        self.state(phase) == Some(PhaseState::Completed)
    }

    pub fn completed(&self) -> Vec<String> {
        self.inner.completed.lock().clone()
    }

    pub fn mark_completed(&self, phase: &str) {
        if self.transition(phase, PhaseState::Completed) {
            self.inner.completed.lock().push(phase.to_string());
            tracing::debug!(phase, "Phase marked completed");
        }
    }

    pub fn mark_failed(&self, phase: &str) {
        if self.transition(phase, PhaseState::Failed) {
            tracing::debug!(phase, "Phase marked failed");
        }
    }

    /// Release waiters of every phase that has not completed.
    pub fn fail_pending(&self) {
        for name in self.inner.channels.keys() {
            self.transition(name, PhaseState::Failed);
        }
    }

    /// Move a pending phase to `state`. Settled phases never change.
    fn transition(&self, phase: &str, state: PhaseState) -> bool {
        let Some(tx) = self.inner.channels.get(phase) else {
            tracing::warn!(phase, "Ignoring state change for unknown phase");
            return false;
        };
        tx.send_if_modified(|current| {
            if *current == PhaseState::Pending {
                *current = state;
                true
            } else {
                false
            }
        })
    }

    /// Resolve once `phase` has completed.
    ///
    /// # Errors
    ///
    /// Fails if the phase is unknown or the run aborted before it completed.
    pub async fn wait(&self, phase: &str) -> BootResult<()> {
        let tx = self
            .inner
            .channels
            .get(phase)
            .ok_or_else(|| BootError::Internal(format!("unknown phase '{}'", phase)))?;
        let mut rx = tx.subscribe();

        let state = rx
            .wait_for(|state| *state != PhaseState::Pending)
            .await
            .map(|state| *state)
            .map_err(|_| BootError::Internal(format!("phase '{}' tracker closed", phase)))?;

        match state {
            PhaseState::Completed => Ok(()),
            _ => Err(BootError::Internal(format!(
                "phase '{}' aborted before completing",
                phase
            ))),
        }
    }
}
