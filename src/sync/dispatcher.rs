//! Action Dispatcher
//!
//! Sends lifecycle mutations for a signal and reconverges with the
//! repository afterwards. The signal stays marked in flight from before the
//! request until the reconciling refresh has landed, so a second action can
//! never be issued against state the operator has not seen yet.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::events::Notice;
use super::poller::Poller;
use super::store::SignalStore;
use crate::error::DispatchError;
use crate::repository::{SignalAction, SignalRepository};
use crate::signal::{SignalId, SignalStatus};

/// Clears the in-flight mark even if the dispatch future is dropped.
struct InFlightGuard<'a> {
    store: &'a SignalStore,
    id: &'a SignalId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.store.finish_action(self.id);
    }
}

#[derive(Clone)]
pub struct ActionDispatcher {
    repository: Arc<dyn SignalRepository>,
    store: Arc<SignalStore>,
    poller: Poller,
}

impl ActionDispatcher {
    pub fn new(
        repository: Arc<dyn SignalRepository>,
        store: Arc<SignalStore>,
        poller: Poller,
    ) -> Self {
        Self {
            repository,
            store,
            poller,
        }
    }

    /// Request `action` for `id`.
    ///
    /// Contract violations (busy signal, feedback before healing) are
    /// rejected before anything is sent. Otherwise the mutation is sent, one
    /// refresh is awaited whatever the outcome, and only then is the signal
    /// released.
    pub async fn dispatch(&self, action: SignalAction, id: &SignalId) -> Result<(), DispatchError> {
        if let SignalAction::Feedback(_) = action {
            self.check_feedback_allowed(id)?;
        }

        if !self.store.try_begin_action(id) {
            debug!(%id, %action, "rejected: action already in flight");
            return Err(DispatchError::Busy(id.clone()));
        }
        let _guard = InFlightGuard { store: &self.store, id };

        info!(%id, %action, "dispatching signal action");
        let result = self.repository.mutate(id, action).await;

        if let Err(err) = &result {
            warn!(%id, %action, error = %err, "signal action failed");
            let message = format!("{action} failed for signal {id}, state unchanged: {err}");
            self.store.notify(Notice::error(message).for_signal(id));
        }

        // Failures are logged and published by the poller itself.
        if self.poller.refresh().await.is_err() {
            debug!(%id, "reconciling refresh failed; last snapshot kept");
        }

        result.map_err(|source| DispatchError::Mutation {
            id: id.clone(),
            action: action.name(),
            source,
        })
    }

    fn check_feedback_allowed(&self, id: &SignalId) -> Result<(), DispatchError> {
        let snapshot = self.store.snapshot();
        match snapshot.get(id).map(|signal| &signal.status) {
            Some(SignalStatus::Healed) => Ok(()),
            Some(status) => Err(DispatchError::FeedbackNotAllowed {
                id: id.clone(),
                status: status.to_string(),
            }),
            None => Err(DispatchError::FeedbackNotAllowed {
                id: id.clone(),
                status: "absent".to_string(),
            }),
        }
    }
}
