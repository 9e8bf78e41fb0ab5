//! Signal Records
//!
//! Wire model for the anomalies served by the signal repository. Decoding is
//! deliberately lenient: ids may be integers or strings, status and severity
//! are matched loosely, and an unrecognized status is kept rather than rejected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque, stable identifier of a signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SignalId(String);

impl SignalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SignalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for SignalId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for SignalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => SignalId(s),
            RawId::Unsigned(n) => SignalId(n.to_string()),
            RawId::Signed(n) => SignalId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    High,
    #[default]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Low => "low",
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Severity::High,
            _ => Severity::Low,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Severity::from).unwrap_or_default())
    }
}

/// Remediation workflow state as reported by the repository.
///
/// The client never computes transitions; it only reads this value back after
/// each refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalStatus {
    Pending,
    /// Remediation is running server-side; nothing to do but wait.
    Healing,
    AwaitingApproval,
    EngineerAssigned,
    Healed,
    Unknown(String),
}

impl SignalStatus {
    /// Canonical wire name.
    pub fn as_str(&self) -> &str {
        match self {
            SignalStatus::Pending => "pending",
            SignalStatus::Healing => "healing",
            SignalStatus::AwaitingApproval => "awaiting_approval",
            SignalStatus::EngineerAssigned => "engineer_assigned",
            SignalStatus::Healed => "healed",
            SignalStatus::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SignalStatus {
    fn from(s: String) -> Self {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "pending" => SignalStatus::Pending,
            "healing" => SignalStatus::Healing,
            "awaitingapproval" => SignalStatus::AwaitingApproval,
            "engineerassigned" => SignalStatus::EngineerAssigned,
            "healed" => SignalStatus::Healed,
            _ => SignalStatus::Unknown(s),
        }
    }
}

impl From<&str> for SignalStatus {
    fn from(s: &str) -> Self {
        SignalStatus::from(s.to_string())
    }
}

impl Serialize for SignalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SignalStatus::from)
    }
}

/// Operator judgment on a completed remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Positive,
    Negative,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Positive => "positive",
            Vote::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPhase {
    Observe,
    Reason,
    Decide,
    Act,
    #[serde(other)]
    Other,
}

impl StepPhase {
    pub fn label(&self) -> &'static str {
        match self {
            StepPhase::Observe => "OBSERVE",
            StepPhase::Reason => "REASON",
            StepPhase::Decide => "DECIDE",
            StepPhase::Act => "ACT",
            StepPhase::Other => "NOTE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub phase: StepPhase,
    #[serde(default)]
    pub detail: String,
}

/// Structured remediation output. Present only once a heal has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub steps: Vec<ReasoningStep>,
    /// Whether historical-memory retrieval informed the diagnosis.
    #[serde(default, alias = "memory_used")]
    pub memory_informed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, deserialize_with = "deserialize_frequency")]
    pub frequency: u64,
    pub status: SignalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
    #[serde(
        default,
        deserialize_with = "deserialize_feedback",
        skip_serializing_if = "Option::is_none"
    )]
    pub feedback: Option<Vote>,
    /// Free-form telemetry attached by the repository.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Signal {
    pub fn new(id: impl Into<SignalId>, merchant: impl Into<String>, status: SignalStatus) -> Self {
        Self {
            id: id.into(),
            merchant: merchant.into(),
            description: String::new(),
            severity: Severity::default(),
            frequency: 0,
            status,
            diagnosis: None,
            feedback: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_frequency(mut self, frequency: u64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Checkout failures outrank everything else on the board.
    pub fn is_checkout_failure(&self) -> bool {
        self.description.to_lowercase().contains("checkout")
    }

    pub fn is_critical(&self) -> bool {
        self.is_checkout_failure() || self.severity == Severity::High
    }
}

/// Any JSON number counts; fractions truncate, negatives and `null` are 0.
fn deserialize_frequency<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(match raw {
        Some(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        None => 0,
    })
}

/// Anything other than a recognised vote means no feedback yet.
fn deserialize_feedback<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vote>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("positive") => Some(Vote::Positive),
        Some("negative") => Some(Vote::Negative),
        _ => None,
    })
}
