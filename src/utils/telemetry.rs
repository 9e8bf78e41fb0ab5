//! Logging Setup
//!
//! Structured `tracing` output filtered by `RUST_LOG`, falling back to the
//! crate at info level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const DEFAULT_FILTER: &str = "healflow=info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}
