//! Signal Store
//!
//! The console's only shared mutable state: the latest snapshot, the
//! selection, and the set of signals with an action in flight. Each field has
//! exactly one writer (poller, selection, dispatcher) and any number of
//! readers. Values are swapped whole through `watch` channels, so a reader
//! always sees either the old value or the new one.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use super::events::{ConsoleEvent, EventBus, Notice};
use super::selection::SelectionTracker;
use crate::signal::{Signal, SignalId, Snapshot};

/// What happened to a fetched collection handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Replaced,
    /// Deep-equal to the current snapshot; nothing republished.
    Unchanged,
    /// A newer refresh was already applied; this response was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
struct Published {
    ticket: u64,
    snapshot: Arc<Snapshot>,
}

pub struct SignalStore {
    snapshot: watch::Sender<Published>,
    selection: watch::Sender<SelectionTracker>,
    in_flight: watch::Sender<BTreeSet<SignalId>>,
    events: EventBus,
}

impl SignalStore {
    pub fn new() -> Self {
        Self {
            snapshot: watch::Sender::new(Published {
                ticket: 0,
                snapshot: Arc::new(Snapshot::empty()),
            }),
            selection: watch::Sender::new(SelectionTracker::new()),
            in_flight: watch::Sender::new(BTreeSet::new()),
            events: EventBus::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().snapshot.clone()
    }

    pub fn selected_id(&self) -> Option<SignalId> {
        self.selection.borrow().selected_id().cloned()
    }

    /// The selected signal as it appears in the latest snapshot.
    pub fn current(&self) -> Option<Signal> {
        let snapshot = self.snapshot();
        let tracker = self.selection.borrow();
        tracker.current(&snapshot).cloned()
    }

    pub fn is_in_flight(&self, id: &SignalId) -> bool {
        self.in_flight.borrow().contains(id)
    }

    pub fn in_flight(&self) -> BTreeSet<SignalId> {
        self.in_flight.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }

    pub fn notify(&self, notice: Notice) {
        self.events.publish(ConsoleEvent::Notice(notice));
    }

    pub fn select(&self, id: SignalId) {
        let published = id.clone();
        if self.selection.send_if_modified(|tracker| tracker.select(id)) {
            debug!(id = %published, "selection changed");
            self.events.publish(ConsoleEvent::SelectionChanged { id: Some(published) });
        }
    }

    pub fn clear_selection(&self) {
        if self.selection.send_if_modified(|tracker| tracker.clear()) {
            self.events.publish(ConsoleEvent::SelectionChanged { id: None });
        }
    }

    /// Publish the result of refresh number `ticket`. Only the poller calls this.
    pub(crate) fn apply_snapshot(&self, ticket: u64, snapshot: Snapshot) -> ApplyOutcome {
        let incoming = Arc::new(snapshot);
        let mut outcome = ApplyOutcome::Superseded;

        let replaced = self.snapshot.send_if_modified(|published| {
            if ticket <= published.ticket {
                return false;
            }
            published.ticket = ticket;
            if *published.snapshot == *incoming {
                outcome = ApplyOutcome::Unchanged;
                return false;
            }
            published.snapshot = incoming.clone();
            outcome = ApplyOutcome::Replaced;
            true
        });

        if replaced {
            self.events.publish(ConsoleEvent::SnapshotChanged {
                signals: incoming.len(),
            });
        }

        if outcome != ApplyOutcome::Superseded {
            let mut auto_selected = None;
            let moved = self.selection.send_if_modified(|tracker| {
                let moved = tracker.auto_select_first(&incoming);
                auto_selected = tracker.selected_id().cloned();
                moved
            });
            if moved {
                debug!(id = ?auto_selected, "auto-selected first signal");
                self.events.publish(ConsoleEvent::SelectionChanged { id: auto_selected });
            }
        }

        outcome
    }

    /// Mark `id` busy. False if it already was. Only the dispatcher calls this.
    pub(crate) fn try_begin_action(&self, id: &SignalId) -> bool {
        let began = self.in_flight.send_if_modified(|set| set.insert(id.clone()));
        if began {
            self.events.publish(ConsoleEvent::InFlightChanged {
                id: id.clone(),
                in_flight: true,
            });
        }
        began
    }

    pub(crate) fn finish_action(&self, id: &SignalId) {
        if self.in_flight.send_if_modified(|set| set.remove(id)) {
            self.events.publish(ConsoleEvent::InFlightChanged {
                id: id.clone(),
                in_flight: false,
            });
        }
    }
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalStatus;

    fn snapshot(ids: &[&str]) -> Snapshot {
        Snapshot::from_signals(
            ids.iter()
                .map(|id| Signal::new(*id, "m", SignalStatus::Pending))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_stale_ticket_is_superseded() {
        let store = SignalStore::new();

        assert_eq!(store.apply_snapshot(2, snapshot(&["new"])), ApplyOutcome::Replaced);
        assert_eq!(store.apply_snapshot(1, snapshot(&["old"])), ApplyOutcome::Superseded);
        assert!(store.snapshot().contains(&"new".into()));
    }

    #[test]
    fn test_equal_snapshot_is_not_republished() {
        let store = SignalStore::new();
        let mut events = store.subscribe();

        store.apply_snapshot(1, snapshot(&["A"]));
        let first = store.snapshot();
        assert_eq!(store.apply_snapshot(2, snapshot(&["A"])), ApplyOutcome::Unchanged);
        assert!(Arc::ptr_eq(&first, &store.snapshot()));

        assert_eq!(events.try_recv().unwrap(), ConsoleEvent::SnapshotChanged { signals: 1 });
        assert_eq!(
            events.try_recv().unwrap(),
            ConsoleEvent::SelectionChanged { id: Some("A".into()) }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_in_flight_is_exclusive() {
        let store = SignalStore::new();
        let id = SignalId::from("X");

        assert!(store.try_begin_action(&id));
        assert!(!store.try_begin_action(&id));
        assert!(store.is_in_flight(&id));

        store.finish_action(&id);
        assert!(!store.is_in_flight(&id));
        assert!(store.try_begin_action(&id));
    }

    #[test]
    fn test_current_resolves_against_latest_snapshot() {
        let store = SignalStore::new();
        store.apply_snapshot(1, snapshot(&["A", "B"]));
        store.select("B".into());
        assert_eq!(store.current().unwrap().id.as_str(), "B");

        store.apply_snapshot(2, snapshot(&["A"]));
        assert!(store.current().is_none());
        assert_eq!(store.selected_id().unwrap().as_str(), "B");
    }
}
