//! Selection Tracker
//!
//! Remembers *which* signal is selected, never the signal itself. Every read
//! resolves the id against the snapshot it is given, so a refresh that
//! reorders or rebuilds records cannot make the selection jump.

use crate::signal::{Signal, SignalId, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: Option<SignalId>,
    /// One-shot bootstrap: pick the first signal of the first non-empty snapshot.
    auto_select_armed: bool,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self {
            selected: None,
            auto_select_armed: true,
        }
    }

    /// Track `id` whether or not it is present right now. An explicit choice
    /// also disarms auto-selection so a late first snapshot cannot override it.
    pub fn select(&mut self, id: SignalId) -> bool {
        self.auto_select_armed = false;
        let changed = self.selected.as_ref() != Some(&id);
        self.selected = Some(id);
        changed
    }

    pub fn clear(&mut self) -> bool {
        self.selected.take().is_some()
    }

    pub fn selected_id(&self) -> Option<&SignalId> {
        self.selected.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.auto_select_armed
    }

    pub fn current<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a Signal> {
        self.selected.as_ref().and_then(|id| snapshot.get(id))
    }

    /// Returns true when this call changed the selection.
    pub fn auto_select_first(&mut self, snapshot: &Snapshot) -> bool {
        if !self.auto_select_armed {
            return false;
        }
        let Some(first) = snapshot.first() else {
            return false;
        };
        self.auto_select_armed = false;
        let changed = self.selected.as_ref() != Some(&first.id);
        self.selected = Some(first.id.clone());
        changed
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
