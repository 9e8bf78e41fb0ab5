//! Lifecycle View Model
//!
//! Pure projections from (signal, in-flight) into what a front end shows and
//! which buttons are live. Nothing here holds state.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::signal::{Signal, SignalId, SignalStatus, Snapshot, Vote};

/// Operator affordances. Feedback carries its vote only at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Heal,
    Accept,
    Reject,
    Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    #[serde(rename = "CRITICAL_FAIL")]
    CriticalFail,
    #[serde(rename = "SIGNAL_IDLE")]
    SignalIdle,
}

impl Badge {
    pub fn for_signal(signal: &Signal) -> Self {
        if signal.is_critical() {
            Badge::CriticalFail
        } else {
            Badge::SignalIdle
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Badge::CriticalFail => "CRITICAL_FAIL",
            Badge::SignalIdle => "SIGNAL_IDLE",
        }
    }
}

/// Actions the workflow admits from `status`, ignoring in-flight state.
pub fn legal_actions(status: &SignalStatus, feedback: Option<Vote>) -> BTreeSet<ActionKind> {
    match status {
        SignalStatus::Pending => BTreeSet::from([ActionKind::Heal]),
        SignalStatus::AwaitingApproval => BTreeSet::from([ActionKind::Accept, ActionKind::Reject]),
        SignalStatus::Healed if feedback.is_none() => BTreeSet::from([ActionKind::Feedback]),
        _ => BTreeSet::new(),
    }
}

pub fn status_label(status: &SignalStatus) -> String {
    match status {
        SignalStatus::Unknown(raw) => format!("UNKNOWN({raw})"),
        known => known.as_str().to_uppercase(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleView {
    pub signal_id: Option<SignalId>,
    pub merchant: Option<String>,
    pub description: Option<String>,
    pub status_label: String,
    pub badge: Option<Badge>,
    pub enabled_actions: BTreeSet<ActionKind>,
    pub diagnosis_text: Option<String>,
    /// Pretty-printed repository telemetry, if any was attached.
    pub telemetry: Option<String>,
    pub in_flight: bool,
}

impl LifecycleView {
    pub fn derive(signal: Option<&Signal>, in_flight: bool) -> Self {
        let Some(signal) = signal else {
            return Self {
                signal_id: None,
                merchant: None,
                description: None,
                status_label: "AWAITING_INPUT_SIGNAL".to_string(),
                badge: None,
                enabled_actions: BTreeSet::new(),
                diagnosis_text: None,
                telemetry: None,
                in_flight,
            };
        };

        let enabled_actions = if in_flight {
            BTreeSet::new()
        } else {
            legal_actions(&signal.status, signal.feedback)
        };

        Self {
            signal_id: Some(signal.id.clone()),
            merchant: Some(signal.merchant.clone()),
            description: Some(signal.description.clone()),
            status_label: status_label(&signal.status),
            badge: Some(Badge::for_signal(signal)),
            enabled_actions,
            diagnosis_text: diagnosis_text(signal),
            telemetry: telemetry(signal),
            in_flight,
        }
    }

    pub fn allows(&self, action: ActionKind) -> bool {
        self.enabled_actions.contains(&action)
    }
}

fn diagnosis_text(signal: &Signal) -> Option<String> {
    let Some(diagnosis) = &signal.diagnosis else {
        return match signal.status {
            SignalStatus::Healing => Some("> ANALYZING_DELTA...".to_string()),
            _ => None,
        };
    };

    let mut text = format!("ROOT_CAUSE: {}", diagnosis.root_cause);
    for step in &diagnosis.steps {
        let _ = write!(text, "\n> {}: {}", step.phase.label(), step.detail);
    }
    if diagnosis.memory_informed {
        text.push_str("\n[informed by remediation memory]");
    }
    Some(text)
}

fn telemetry(signal: &Signal) -> Option<String> {
    if signal.metadata.is_null() {
        return None;
    }
    serde_json::to_string_pretty(&signal.metadata).ok()
}

/// One line of the signal list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    pub id: SignalId,
    pub merchant: String,
    pub badge: Badge,
    pub frequency: u64,
    pub selected: bool,
}

/// The signal list in priority order, with the selection marked.
pub fn board(snapshot: &Snapshot, selected: Option<&SignalId>) -> Vec<BoardRow> {
    snapshot
        .prioritized()
        .into_iter()
        .map(|signal| BoardRow {
            id: signal.id.clone(),
            merchant: signal.merchant.clone(),
            badge: Badge::for_signal(signal),
            frequency: signal.frequency,
            selected: selected == Some(&signal.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Diagnosis, ReasoningStep, StepPhase};

    fn signal(status: SignalStatus) -> Signal {
        Signal::new("1", "MUMBAI_PAY", status).with_description("GATEWAY_TIMEOUT_504")
    }

    #[test]
    fn test_enabled_actions_per_status() {
        let view = LifecycleView::derive(Some(&signal(SignalStatus::Pending)), false);
        assert_eq!(view.enabled_actions, BTreeSet::from([ActionKind::Heal]));

        let view = LifecycleView::derive(Some(&signal(SignalStatus::AwaitingApproval)), false);
        assert_eq!(view.enabled_actions, BTreeSet::from([ActionKind::Accept, ActionKind::Reject]));

        let view = LifecycleView::derive(Some(&signal(SignalStatus::Healed)), false);
        assert_eq!(view.enabled_actions, BTreeSet::from([ActionKind::Feedback]));

        let mut voted = signal(SignalStatus::Healed);
        voted.feedback = Some(Vote::Positive);
        assert!(LifecycleView::derive(Some(&voted), false).enabled_actions.is_empty());

        for inert in [
            SignalStatus::Healing,
            SignalStatus::EngineerAssigned,
            SignalStatus::Unknown("quarantined".into()),
        ] {
            assert!(LifecycleView::derive(Some(&signal(inert)), false).enabled_actions.is_empty());
        }
    }

    #[test]
    fn test_in_flight_disables_everything() {
        let view = LifecycleView::derive(Some(&signal(SignalStatus::AwaitingApproval)), true);
        assert!(view.enabled_actions.is_empty());
        assert!(view.in_flight);
        assert_eq!(view.status_label, "AWAITING_APPROVAL");
    }

    #[test]
    fn test_unknown_status_renders_inertly() {
        let unknown = signal(SignalStatus::Unknown("Quarantined".into()));
        let view = LifecycleView::derive(Some(&unknown), false);
        assert_eq!(view.status_label, "UNKNOWN(Quarantined)");
        assert!(!view.allows(ActionKind::Heal));
    }

    #[test]
    fn test_no_selection() {
        let view = LifecycleView::derive(None, false);
        assert_eq!(view.status_label, "AWAITING_INPUT_SIGNAL");
        assert!(view.signal_id.is_none());
        assert!(view.enabled_actions.is_empty());
    }

    #[test]
    fn test_diagnosis_trail() {
        let mut healed = signal(SignalStatus::AwaitingApproval);
        healed.diagnosis = Some(Diagnosis {
            root_cause: "upstream 504s".into(),
            steps: vec![
                ReasoningStep { phase: StepPhase::Observe, detail: "latency spike".into() },
                ReasoningStep { phase: StepPhase::Act, detail: "raise timeout".into() },
            ],
            memory_informed: true,
        });

        let text = LifecycleView::derive(Some(&healed), false).diagnosis_text.unwrap();
        assert_eq!(
            text,
            "ROOT_CAUSE: upstream 504s\n> OBSERVE: latency spike\n> ACT: raise timeout\n\
             [informed by remediation memory]"
        );

        let healing = LifecycleView::derive(Some(&signal(SignalStatus::Healing)), false);
        assert_eq!(healing.diagnosis_text.as_deref(), Some("> ANALYZING_DELTA..."));
        assert!(LifecycleView::derive(Some(&signal(SignalStatus::Pending)), false)
            .diagnosis_text
            .is_none());
    }

    #[test]
    fn test_board_marks_selection() {
        let snapshot = Snapshot::from_signals(vec![
            signal(SignalStatus::Pending),
            Signal::new("2", "SHOPCO", SignalStatus::Pending).with_description("checkout 500s"),
        ])
        .unwrap();

        let rows = board(&snapshot, Some(&"1".into()));
        assert_eq!(rows[0].id.as_str(), "2");
        assert_eq!(rows[0].badge, Badge::CriticalFail);
        assert!(!rows[0].selected);
        assert_eq!(rows[1].badge, Badge::SignalIdle);
        assert!(rows[1].selected);
    }
}
