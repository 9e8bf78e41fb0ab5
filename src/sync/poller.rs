//! Snapshot Poller
//!
//! The sole writer of the snapshot. Refreshes on a fixed cadence and on
//! demand; a failed fetch keeps the last good snapshot and polling carries on.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::events::Notice;
use super::store::{ApplyOutcome, SignalStore};
use crate::error::RefreshError;
use crate::repository::SignalRepository;
use crate::signal::Snapshot;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// How fresh the local snapshot is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollHealth {
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl PollHealth {
    /// Serving a stale snapshot because recent fetches failed.
    pub fn is_degraded(&self) -> bool {
        self.consecutive_failures > 0
    }
}

/// Health plus the ticket of the refresh that last wrote it, so a slow,
/// older response cannot overwrite the outcome of a newer one.
#[derive(Debug, Default)]
struct TrackedHealth {
    ticket: u64,
    health: PollHealth,
}

struct PollerTask {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

#[derive(Clone)]
pub struct Poller {
    repository: Arc<dyn SignalRepository>,
    store: Arc<SignalStore>,
    next_ticket: Arc<AtomicU64>,
    health: Arc<watch::Sender<TrackedHealth>>,
    lifecycle: Arc<Mutex<Option<PollerTask>>>,
}

impl Poller {
    pub fn new(repository: Arc<dyn SignalRepository>, store: Arc<SignalStore>) -> Self {
        Self {
            repository,
            store,
            next_ticket: Arc::new(AtomicU64::new(1)),
            health: Arc::new(watch::Sender::new(TrackedHealth::default())),
            lifecycle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn health(&self) -> PollHealth {
        self.health.borrow().health.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.lifecycle.lock().await.is_some()
    }

    /// Fetch the full collection and publish it as the new snapshot.
    ///
    /// A response that completes after a newer refresh has already been
    /// applied is discarded and reported as [`ApplyOutcome::Superseded`].
    pub async fn refresh(&self) -> Result<ApplyOutcome, RefreshError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);

        let fetched = self
            .repository
            .list()
            .await
            .map_err(RefreshError::from)
            .and_then(|signals| {
                Snapshot::from_signals(signals).map_err(RefreshError::DuplicateSignalId)
            });

        match fetched {
            Ok(snapshot) => {
                let outcome = self.store.apply_snapshot(ticket, snapshot);
                debug!(ticket, ?outcome, "refresh applied");

                let mut recovered = false;
                self.record_health(ticket, |health| {
                    recovered = health.is_degraded();
                    health.last_success_at = Some(Utc::now());
                    health.consecutive_failures = 0;
                    health.last_error = None;
                });
                if recovered {
                    info!("signal repository reachable again");
                    self.store.notify(Notice::info("signal repository reachable again"));
                }
                Ok(outcome)
            }
            Err(err) => {
                warn!(ticket, error = %err, "signal refresh failed, keeping last snapshot");
                let recorded = self.record_health(ticket, |health| {
                    health.consecutive_failures = health.consecutive_failures.saturating_add(1);
                    health.last_error = Some(err.to_string());
                });
                if recorded {
                    self.store.notify(Notice::warning(format!(
                        "refresh failed, showing last known signals: {err}"
                    )));
                } else {
                    debug!(ticket, "failure predates a newer refresh; health left as is");
                }
                Err(err)
            }
        }
    }

    /// Apply `update` unless a newer refresh already reported. Returns whether
    /// it was applied.
    fn record_health(&self, ticket: u64, update: impl FnOnce(&mut PollHealth)) -> bool {
        self.health.send_if_modified(|tracked| {
            if ticket < tracked.ticket {
                return false;
            }
            tracked.ticket = ticket;
            update(&mut tracked.health);
            true
        })
    }

    /// Refresh now and then every `every` until [`Poller::stop`]. No-op if
    /// already running.
    pub async fn start(&self, every: Duration) {
        let mut guard = self.lifecycle.lock().await;
        if guard.is_some() {
            return;
        }

        let every = every.max(MIN_INTERVAL);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let poller = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // Stop wins over a tick that became ready while a refresh ran.
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        // Failures are already logged and published by refresh().
                        let _ = poller.refresh().await;
                    }
                }
            }
            debug!("poll loop exited");
        });

        info!(interval_ms = every.as_millis() as u64, "📡 signal polling started");
        *guard = Some(PollerTask { stop_tx, task });
    }

    /// Stop scheduling refreshes. A scheduled refresh already in flight runs to
    /// completion and is applied before this returns; nothing new starts after.
    /// Calling it again is harmless.
    pub async fn stop(&self) {
        let state = {
            let mut guard = self.lifecycle.lock().await;
            guard.take()
        };

        if let Some(state) = state {
            let _ = state.stop_tx.send(());
            if let Err(e) = state.task.await {
                warn!(error = %e, "poll task ended abnormally");
            }
            info!("signal polling stopped");
        }
    }
}
