//! Signal Repository Interface and Implementations
//!
//! The repository is the authoritative store of signals and their workflow
//! state. The console only lists and requests transitions; it never assumes
//! the outcome of a mutation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RepositoryError;
use crate::signal::{Signal, SignalId, Vote};

pub mod http;
pub mod memory;

pub use http::HttpSignalRepository;
pub use memory::InMemorySignalRepository;

/// A lifecycle mutation the operator can request for a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "vote", rename_all = "snake_case")]
pub enum SignalAction {
    Heal,
    Accept,
    Reject,
    Feedback(Vote),
}

impl SignalAction {
    /// Last path segment of the mutation endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            SignalAction::Heal => "heal",
            SignalAction::Accept => "accept",
            SignalAction::Reject => "reject",
            SignalAction::Feedback(_) => "feedback",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Feedback(vote) => write!(f, "feedback({})", vote.as_str()),
            other => f.write_str(other.name()),
        }
    }
}

#[async_trait]
pub trait SignalRepository: Send + Sync {
    /// Full collection, in repository order. No pagination.
    async fn list(&self) -> Result<Vec<Signal>, RepositoryError>;

    /// Request a transition. The response carries no state the client uses.
    async fn mutate(&self, id: &SignalId, action: SignalAction) -> Result<(), RepositoryError>;
}
