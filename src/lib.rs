//! HealFlow Signal Console
//!
//! Client-side core of the HealFlow remediation dashboard:
//! - Polls the signal repository and replaces a local snapshot wholesale
//! - Tracks the selected signal by id across refreshes
//! - Dispatches heal / accept / reject / feedback with per-signal exclusion
//! - Derives display state and legal actions as a pure view model

pub mod config;
pub mod console;
pub mod error;
pub mod repository;
pub mod signal;
pub mod sync;
pub mod utils;

// Re-exports for convenience
pub use config::SyncConfig;
pub use console::{ActionKind, HealConsole, LifecycleView};
pub use error::{ConfigError, DispatchError, RefreshError, RepositoryError};
pub use repository::{
    HttpSignalRepository, InMemorySignalRepository, SignalAction, SignalRepository,
};
pub use signal::{Signal, SignalId, SignalStatus, Snapshot, Vote};
pub use sync::{ConsoleEvent, Notice, NoticeLevel};
