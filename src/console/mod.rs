//! Heal Console
//!
//! Front-end facing facade: one store, one poller, one dispatcher, all
//! sharing the same repository. Front ends call into this and listen on
//! [`HealConsole::subscribe`] to know when to re-derive their views.

pub mod view;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::SyncConfig;
use crate::error::{DispatchError, RefreshError};
use crate::repository::{SignalAction, SignalRepository};
use crate::signal::{SignalId, Snapshot};
use crate::sync::{ActionDispatcher, ApplyOutcome, ConsoleEvent, PollHealth, Poller, SignalStore};

pub use view::{board, legal_actions, ActionKind, Badge, BoardRow, LifecycleView};

pub struct HealConsole {
    store: Arc<SignalStore>,
    poller: Poller,
    dispatcher: ActionDispatcher,
    poll_interval: Duration,
}

impl HealConsole {
    pub fn new(repository: Arc<dyn SignalRepository>, config: &SyncConfig) -> Self {
        let store = Arc::new(SignalStore::new());
        let poller = Poller::new(repository.clone(), store.clone());
        let dispatcher = ActionDispatcher::new(repository, store.clone(), poller.clone());
        Self {
            store,
            poller,
            dispatcher,
            poll_interval: config.poll_interval,
        }
    }

    pub fn store(&self) -> &Arc<SignalStore> {
        &self.store
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Begin periodic refresh at the configured interval.
    pub async fn start(&self) {
        self.poller.start(self.poll_interval).await;
    }

    pub async fn stop(&self) {
        self.poller.stop().await;
    }

    pub async fn refresh(&self) -> Result<ApplyOutcome, RefreshError> {
        self.poller.refresh().await
    }

    pub fn select(&self, id: impl Into<SignalId>) {
        self.store.select(id.into());
    }

    pub fn clear_selection(&self) {
        self.store.clear_selection();
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn health(&self) -> PollHealth {
        self.poller.health()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.store.subscribe()
    }

    /// Display state for the current selection, resolved against the latest snapshot.
    pub fn view(&self) -> LifecycleView {
        let current = self.store.current();
        let in_flight = current
            .as_ref()
            .is_some_and(|signal| self.store.is_in_flight(&signal.id));
        LifecycleView::derive(current.as_ref(), in_flight)
    }

    pub fn board(&self) -> Vec<BoardRow> {
        let selected = self.store.selected_id();
        board(&self.snapshot(), selected.as_ref())
    }

    pub async fn dispatch(&self, action: SignalAction, id: &SignalId) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(action, id).await
    }

    /// Dispatch against whatever is selected right now.
    pub async fn dispatch_selected(&self, action: SignalAction) -> Result<(), DispatchError> {
        let id = self.store.selected_id().ok_or(DispatchError::NoSelection)?;
        self.dispatcher.dispatch(action, &id).await
    }
}
