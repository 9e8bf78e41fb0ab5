//! Signal Domain Model
//!
//! Signals, their remediation status, and the snapshot collections the
//! poller replaces on every refresh.

pub mod model;
pub mod snapshot;

pub use model::{
    Diagnosis, ReasoningStep, Severity, Signal, SignalId, SignalStatus, StepPhase, Vote,
};
pub use snapshot::Snapshot;
