//! Console Event Bus
//!
//! Discrete change notifications fanned out to every front end. Listeners
//! read the new state from the store; events only say what moved.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::signal::SignalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Operator-facing message, e.g. a failed refresh or a rejected action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub signal_id: Option<SignalId>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            signal_id: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            signal_id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            signal_id: None,
        }
    }

    pub fn for_signal(mut self, id: &SignalId) -> Self {
        self.signal_id = Some(id.clone());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ConsoleEvent {
    /// A new snapshot replaced the previous one.
    SnapshotChanged { signals: usize },
    SelectionChanged { id: Option<SignalId> },
    InFlightChanged { id: SignalId, in_flight: bool },
    Notice(Notice),
}

pub struct EventBus {
    tx: broadcast::Sender<ConsoleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Publish to all current subscribers. Nobody listening is fine.
    pub fn publish(&self, event: ConsoleEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
