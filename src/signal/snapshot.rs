//! Snapshots
//!
//! One fetch worth of signals. A snapshot is immutable once built and is
//! replaced wholesale by the next one; nothing merges into it.

use std::collections::HashSet;

use super::model::{Signal, SignalId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    signals: Vec<Signal>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot, rejecting collections that repeat an id.
    pub fn from_signals(signals: Vec<Signal>) -> Result<Self, SignalId> {
        let mut seen = HashSet::with_capacity(signals.len());
        for signal in &signals {
            if !seen.insert(&signal.id) {
                return Err(signal.id.clone());
            }
        }
        Ok(Self { signals })
    }

    pub fn get(&self, id: &SignalId) -> Option<&Signal> {
        self.signals.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SignalId) -> bool {
        self.get(id).is_some()
    }

    /// First signal in repository order.
    pub fn first(&self) -> Option<&Signal> {
        self.signals.first()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Display order: checkout failures, then high severity, then by
    /// descending frequency. The sort is stable so ties keep repository order.
    pub fn prioritized(&self) -> Vec<&Signal> {
        let mut ordered: Vec<&Signal> = self.signals.iter().collect();
        ordered.sort_by(|a, b| {
            b.is_checkout_failure()
                .cmp(&a.is_checkout_failure())
                .then_with(|| a.severity.cmp(&b.severity))
                .then_with(|| b.frequency.cmp(&a.frequency))
        });
        ordered
    }
}
