//! Outcome records produced by the workflow engine, quality pipeline
//! and state store.
//!
//! Records are plain serializable data so callers can log or persist them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one step during a workflow execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Position of the step in the executed sequence
    pub step_index: usize,

    /// Name reported by the step
    pub step_name: String,

    /// Whether the step completed without error
    pub success: bool,

    /// Value returned by the step (successful steps only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error message (failed steps only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn succeeded(step_index: usize, step_name: impl Into<String>, result: Value) -> Self {
        Self {
            step_index,
            step_name: step_name.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(step_index: usize, step_name: impl Into<String>, error: String) -> Self {
        Self {
            step_index,
            step_name: step_name.into(),
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

/// A compensation that failed during rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackFailure {
    pub step_index: usize,
    pub step_name: String,
    pub error: String,
}

/// Summary of a rollback pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
    /// Number of compensations invoked
    pub attempted: usize,

    /// Compensations that returned an error, in invocation order
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    /// True when every invoked compensation succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of running one quality check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub passed: bool,

    /// Payload returned by the check (absent when the check errored)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error message when the check itself failed to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of a quality pipeline execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// AND of every check's verdict
    pub passed: bool,

    /// Per-check records, in registration order
    pub checks: Vec<CheckRecord>,

    /// `"; "`-joined descriptions of the failing checks
    pub summary: String,
}

impl PipelineReport {
    /// Look up the record for a named check
    pub fn check(&self, name: &str) -> Option<&CheckRecord> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// A gate that rejected its check's result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedGate {
    pub name: String,
    pub reason: String,
}

/// Result of evaluating every gate against a pipeline report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    pub passed: bool,
    pub failed_gates: Vec<FailedGate>,
}

/// Public view of a stored snapshot (values are not exposed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// Which side of a transition a hook runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    Enter,
    Exit,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => f.write_str("enter"),
            Self::Exit => f.write_str("exit"),
        }
    }
}
