//! Quality check pipeline and acceptance gates.
//!
//! Checks run sequentially and never short-circuit: a failing or erroring
//! check is recorded and the next one still runs. Gates are evaluated
//! afterwards against the recorded check results and report failures as
//! data instead of errors.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{Check, GateValidator};
use crate::domain::{CheckRecord, FailedGate, GateReport, PipelineReport};

/// Reason reported when a validator rejects a result
pub const VALIDATOR_REJECTED: &str = "Validator returned false";

struct NamedCheck {
    name: String,
    check: Arc<dyn Check>,
}

struct NamedGate {
    name: String,
    validator: Arc<dyn GateValidator>,
}

/// Ordered set of checks plus their gates
#[derive(Default)]
pub struct QualityPipeline {
    checks: Vec<NamedCheck>,
    gates: Vec<NamedGate>,
}

impl QualityPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check; names must be unique
    pub fn add_check(
        &mut self,
        name: impl Into<String>,
        check: impl Check + 'static,
    ) -> Result<(), QualityError> {
        let name = name.into();
        if self.checks.iter().any(|c| c.name == name) {
            return Err(QualityError::DuplicateCheck(name));
        }

        self.checks.push(NamedCheck {
            name,
            check: Arc::new(check),
        });
        Ok(())
    }

    /// Register a gate.
    ///
    /// The gate applies to the check with the same name; it is not required
    /// that such a check exists yet.
    pub fn add_gate(&mut self, name: impl Into<String>, validator: impl GateValidator + 'static) {
        self.gates.push(NamedGate {
            name: name.into(),
            validator: Arc::new(validator),
        });
    }

    /// Registered check names, in registration order
    pub fn get_checks(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.name.clone()).collect()
    }

    /// Registered gate names, in registration order
    pub fn get_gates(&self) -> Vec<String> {
        self.gates.iter().map(|g| g.name.clone()).collect()
    }

    /// Run every check in order and aggregate the verdicts
    #[instrument(skip_all, fields(checks = self.checks.len()))]
    pub async fn execute(&self) -> PipelineReport {
        let mut records = Vec::with_capacity(self.checks.len());
        let mut failures = Vec::new();
        let mut passed = true;

        for NamedCheck { name, check } in &self.checks {
            debug!(check = %name, "Running check");

            match check.run().await {
                Ok(outcome) => {
                    if !outcome.passed {
                        passed = false;
                        failures.push(format!("{}: {}", name, describe(&outcome.result)));
                    }
                    records.push(CheckRecord {
                        name: name.clone(),
                        passed: outcome.passed,
                        result: Some(outcome.result),
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(check = %name, error = %e, "Check errored");
                    passed = false;
                    failures.push(format!("{}: {}", name, e));
                    records.push(CheckRecord {
                        name: name.clone(),
                        passed: false,
                        result: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(passed, failed = failures.len(), "Quality checks finished");
        PipelineReport {
            passed,
            checks: records,
            summary: failures.join("; "),
        }
    }

    /// Evaluate every gate against the matching check record.
    ///
    /// Gates whose check is missing from the report are skipped. A
    /// validator that errors or returns `false` fails its gate only.
    pub fn validate_gates(&self, report: &PipelineReport) -> GateReport {
        let mut failed_gates = Vec::new();

        for gate in &self.gates {
            let Some(record) = report.check(&gate.name) else {
                debug!(gate = %gate.name, "No matching check, skipping gate");
                continue;
            };

            let result = record.result.as_ref().unwrap_or(&Value::Null);
            let reason = match gate.validator.validate(result) {
                Ok(true) => continue,
                Ok(false) => VALIDATOR_REJECTED.to_string(),
                Err(e) => e.to_string(),
            };

            warn!(gate = %gate.name, %reason, "Gate failed");
            failed_gates.push(FailedGate {
                name: gate.name.clone(),
                reason,
            });
        }

        GateReport {
            passed: failed_gates.is_empty(),
            failed_gates,
        }
    }
}

/// Render a failing check's result for the summary line
fn describe(result: &Value) -> String {
    match result {
        Value::Null | Value::Bool(false) => "failed".to_string(),
        Value::String(s) if s.is_empty() => "failed".to_string(),
        Value::Number(n) if n.as_f64() == Some(0.0) => "failed".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Registration errors
#[derive(Debug, Clone, Error)]
pub enum QualityError {
    #[error("Duplicate check name: {0}")]
    DuplicateCheck(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CheckOutcome;
    use serde_json::json;

    #[test]
    fn test_describe_falsy_results() {
        assert_eq!(describe(&Value::Null), "failed");
        assert_eq!(describe(&json!(false)), "failed");
        assert_eq!(describe(&json!("")), "failed");
        assert_eq!(describe(&json!(0)), "failed");
        assert_eq!(describe(&json!("3 lint errors")), "3 lint errors");
        assert_eq!(describe(&json!({ "errors": 3 })), r#"{"errors":3}"#);
    }

    #[test]
    fn test_duplicate_check_rejected_gate_names_free() {
        let mut pipeline = QualityPipeline::new();
        pipeline
            .add_check("lint", || async { anyhow::Ok(CheckOutcome::pass(Value::Null)) })
            .unwrap();

        let duplicate =
            pipeline.add_check("lint", || async { anyhow::Ok(CheckOutcome::pass(Value::Null)) });
        assert!(matches!(duplicate, Err(QualityError::DuplicateCheck(n)) if n == "lint"));

        pipeline.add_gate("lint", |_: &Value| anyhow::Ok(true));
        pipeline.add_gate("lint", |_: &Value| anyhow::Ok(false));
        assert_eq!(pipeline.get_gates(), vec!["lint", "lint"]);
    }

    #[tokio::test]
    async fn test_errored_check_gate_sees_null() {
        let mut pipeline = QualityPipeline::new();
        pipeline
            .add_check("build", || async {
                Err::<CheckOutcome, _>(anyhow::anyhow!("compiler crashed"))
            })
            .unwrap();
        pipeline.add_gate("build", |r: &Value| anyhow::Ok(!r.is_null()));

        let report = pipeline.execute().await;
        assert_eq!(report.summary, "build: compiler crashed");

        let gates = pipeline.validate_gates(&report);
        assert!(!gates.passed);
        assert_eq!(gates.failed_gates[0].reason, VALIDATOR_REJECTED);
    }
}
