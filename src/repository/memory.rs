//! In-Memory Signal Repository
//!
//! A self-contained stand-in for the remediation service. It powers the
//! offline demo and the test suites: responses can be delayed, failures can be
//! injected, and every mutation request is recorded.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

use super::{SignalAction, SignalRepository};
use crate::error::RepositoryError;
use crate::signal::{Diagnosis, ReasoningStep, Signal, SignalId, SignalStatus, StepPhase};

#[derive(Default)]
struct RepositoryState {
    signals: Vec<Signal>,
    mutations: Vec<(SignalId, SignalAction)>,
    list_calls: usize,
    list_delays: VecDeque<Duration>,
    list_failures: VecDeque<RepositoryError>,
    mutation_failures: VecDeque<RepositoryError>,
}

#[derive(Clone, Default)]
pub struct InMemorySignalRepository {
    state: Arc<Mutex<RepositoryState>>,
    list_latency: Duration,
    mutation_latency: Duration,
}

impl InMemorySignalRepository {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RepositoryState {
                signals,
                ..RepositoryState::default()
            })),
            ..Self::default()
        }
    }

    /// The three signals the development backend ships with.
    pub fn seeded() -> Self {
        Self::new(vec![
            Signal::new(1u64, "MUMBAI_PAY", SignalStatus::Pending)
                .with_description("GATEWAY_TIMEOUT_504")
                .with_frequency(88),
            Signal::new(2u64, "STEALTH_SAAS", SignalStatus::Pending)
                .with_description("AUTH_TOKEN_EXPIRED")
                .with_frequency(14),
            Signal::new(3u64, "REDACTED_CORP", SignalStatus::Pending)
                .with_description("SQL_INJECTION_ATTEMPT")
                .with_frequency(102),
        ])
    }

    pub fn with_list_latency(mut self, latency: Duration) -> Self {
        self.list_latency = latency;
        self
    }

    pub fn with_mutation_latency(mut self, latency: Duration) -> Self {
        self.mutation_latency = latency;
        self
    }

    /// Replace the collection wholesale, as if another operator acted.
    pub async fn set_signals(&self, signals: Vec<Signal>) {
        self.state.lock().await.signals = signals;
    }

    pub async fn signal(&self, id: &SignalId) -> Option<Signal> {
        self.state.lock().await.signals.iter().find(|s| &s.id == id).cloned()
    }

    /// Answer the next `list` call after `latency` instead of the default.
    pub async fn delay_next_list(&self, latency: Duration) {
        self.state.lock().await.list_delays.push_back(latency);
    }

    /// Make the next `list` call fail with `error`.
    pub async fn fail_next_list(&self, error: RepositoryError) {
        self.state.lock().await.list_failures.push_back(error);
    }

    /// Make the next mutation fail with `error`, leaving state untouched.
    pub async fn fail_next_mutation(&self, error: RepositoryError) {
        self.state.lock().await.mutation_failures.push_back(error);
    }

    pub async fn mutations(&self) -> Vec<(SignalId, SignalAction)> {
        self.state.lock().await.mutations.clone()
    }

    pub async fn list_calls(&self) -> usize {
        self.state.lock().await.list_calls
    }
}

#[async_trait]
impl SignalRepository for InMemorySignalRepository {
    async fn list(&self) -> Result<Vec<Signal>, RepositoryError> {
        // Read at request time, answer after the latency, like a real server.
        let (result, latency) = {
            let mut state = self.state.lock().await;
            state.list_calls += 1;
            let latency = state.list_delays.pop_front().unwrap_or(self.list_latency);
            let result = match state.list_failures.pop_front() {
                Some(err) => Err(err),
                None => Ok(state.signals.clone()),
            };
            (result, latency)
        };
        if !latency.is_zero() {
            sleep(latency).await;
        }
        result
    }

    async fn mutate(&self, id: &SignalId, action: SignalAction) -> Result<(), RepositoryError> {
        self.state.lock().await.mutations.push((id.clone(), action));

        if !self.mutation_latency.is_zero() {
            sleep(self.mutation_latency).await;
        }

        let mut state = self.state.lock().await;
        if let Some(err) = state.mutation_failures.pop_front() {
            return Err(err);
        }

        let signal = state
            .signals
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| RepositoryError::Status {
                status: 404,
                url: format!("memory:///api/signals/{id}/{}", action.name()),
            })?;

        apply(signal, action).map_err(|status| RepositoryError::Status {
            status,
            url: format!("memory:///api/signals/{id}/{}", action.name()),
        })
    }
}

/// Server-side transition policy. Illegal requests answer 409.
fn apply(signal: &mut Signal, action: SignalAction) -> Result<(), u16> {
    match (signal.status.clone(), action) {
        (SignalStatus::Pending, SignalAction::Heal) => {
            signal.diagnosis = Some(canned_diagnosis(signal));
            signal.status = SignalStatus::AwaitingApproval;
        }
        (SignalStatus::AwaitingApproval, SignalAction::Accept) => {
            signal.status = SignalStatus::Healed
        }
        (SignalStatus::AwaitingApproval, SignalAction::Reject) => {
            signal.status = SignalStatus::EngineerAssigned
        }
        (SignalStatus::Healed, SignalAction::Feedback(vote)) if signal.feedback.is_none() => {
            signal.feedback = Some(vote)
        }
        _ => return Err(409),
    }
    Ok(())
}

fn canned_diagnosis(signal: &Signal) -> Diagnosis {
    let step = |phase, detail: String| ReasoningStep { phase, detail };
    Diagnosis {
        root_cause: format!("{} traced to {}", signal.description, signal.merchant),
        steps: vec![
            step(
                StepPhase::Observe,
                format!("{} events at frequency {}", signal.description, signal.frequency),
            ),
            step(StepPhase::Reason, "failure pattern isolated to a single upstream".to_string()),
            step(StepPhase::Decide, "patch is low risk, request approval".to_string()),
            step(StepPhase::Act, "patch staged behind approval gate".to_string()),
        ],
        memory_informed: false,
    }
}
