use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Lifecycle states reported by the pipeline worker. The wire format is a
/// plain string; unrecognized values are preserved verbatim rather than
/// rejected so a newer server cannot break an older console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanStatus {
    Pending,
    Queued,
    Running,
    Finished,
    Failed,
    Cancelled,
    Unknown(String),
}

impl ScanStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Queued => "queued",
            ScanStatus::Running => "running",
            ScanStatus::Finished => "finished",
            ScanStatus::Failed => "failed",
            ScanStatus::Cancelled => "cancelled",
            ScanStatus::Unknown(raw) => raw.as_str(),
        }
    }

    /// Still executing: a live clock drives the displayed duration.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ScanStatus::Pending | ScanStatus::Queued | ScanStatus::Running
        )
    }

    /// No further transitions occur after a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Finished | ScanStatus::Failed | ScanStatus::Cancelled
        )
    }

    /// Cancellation is only offered before the worker picks the job up.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, ScanStatus::Pending | ScanStatus::Queued)
    }
}

impl FromStr for ScanStatus {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Ok(match input.trim().to_lowercase().as_str() {
            "pending" => ScanStatus::Pending,
            "queued" => ScanStatus::Queued,
            "running" => ScanStatus::Running,
            "finished" => ScanStatus::Finished,
            "failed" => ScanStatus::Failed,
            "cancelled" | "canceled" => ScanStatus::Cancelled,
            _ => ScanStatus::Unknown(input.trim().to_string()),
        })
    }
}

impl From<String> for ScanStatus {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or(ScanStatus::Unknown(raw))
    }
}

impl From<ScanStatus> for String {
    fn from(status: ScanStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted scan run, wire name `ScanResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: i64,
    #[serde(default)]
    pub repo: String,
    pub status: ScanStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub pr_number: i64,
    #[serde(default)]
    pub commit_sha: String,
}

/// Per-phase telemetry row, wire name `ScanLog`. A zero token count means
/// "not yet reported", not "zero cost".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseLog {
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub tokens_input: u64,
    #[serde(default)]
    pub tokens_output: u64,
    #[serde(default)]
    pub tokens_total: u64,
    #[serde(default, rename = "model_name")]
    pub model: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Full report envelope for one job. Every sub-section is independently
/// optional; absence means that pipeline phase has not produced output yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(default)]
    pub scanner: Option<ScannerSection>,
    #[serde(default)]
    pub ecosystem: Option<EcosystemSection>,
    #[serde(default)]
    pub remediation: Vec<RemediationEntry>,
    #[serde(default)]
    pub verification: Vec<VerificationEntry>,
    #[serde(default)]
    pub report: Map<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub analysis: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerSection {
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub detected_libraries: BTreeMap<String, Vec<String>>,
}

/// Sandbox environment picked by the ecosystem-detection phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcosystemSection {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub docker_image: String,
    #[serde(default)]
    pub dep_install_cmd: String,
    #[serde(default)]
    pub syntax_cmd: Vec<String>,
    #[serde(default)]
    pub test_cmd: Vec<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// File-level fix proposed by the remediation phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemediationEntry {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub original_code: String,
    #[serde(default)]
    pub fix_code: String,
    #[serde(default)]
    pub test_code: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Outcome of sandbox verification for one fixed file. Matched to a
/// remediation entry by exact path equality; the pairing may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationEntry {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl Vulnerability {
    pub fn severity(&self) -> Option<Severity> {
        Severity::parse(&self.severity)
    }
}

/// The four severities the scanner ranks. Anything else renders with a
/// neutral marker instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

/// Key/value setting row from `/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub is_secret: bool,
}
