//! Synchronization Core
//!
//! Keeps a local view of the signal repository consistent under periodic
//! refresh and operator-triggered mutations.

pub mod dispatcher;
pub mod events;
pub mod poller;
pub mod selection;
pub mod store;

pub use dispatcher::ActionDispatcher;
pub use events::{ConsoleEvent, EventBus, Notice, NoticeLevel};
pub use poller::{PollHealth, Poller};
pub use selection::SelectionTracker;
pub use store::{ApplyOutcome, SignalStore};
