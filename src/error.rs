//! Error Taxonomy
//!
//! Every failure here is recoverable. Repository failures are transient and
//! retried by the next poll; dispatch contract violations are caller bugs and
//! never reach the network.

use thiserror::Error;

use crate::signal::SignalId;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("signal repository unreachable: {0}")]
    Transport(String),
    #[error("signal repository returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("signal repository sent an unreadable payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return RepositoryError::Decode(err.to_string());
        }
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => RepositoryError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ => RepositoryError::Transport(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("signal repository returned duplicate id {0}")]
    DuplicateSignalId(SignalId),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("signal {0} already has an action in flight")]
    Busy(SignalId),
    #[error("feedback needs a healed signal, but {id} is {status}")]
    FeedbackNotAllowed { id: SignalId, status: String },
    #[error("no signal is selected")]
    NoSelection,
    #[error("{action} failed for signal {id}, state unchanged: {source}")]
    Mutation {
        id: SignalId,
        action: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl DispatchError {
    /// Rejected locally without contacting the repository.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, DispatchError::Mutation { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}
