//! Ordered step execution with compensating rollback.
//!
//! Steps run strictly in sequence against a shared context. The first
//! failing step stops the run; the steps that completed before it stay in
//! the ledger so `rollback` can compensate them in reverse order.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::Step;
use crate::domain::{ExecutionRecord, RollbackFailure, RollbackReport};

/// A step that completed, remembered for compensation
struct LedgerEntry<C> {
    index: usize,
    step: Arc<dyn Step<C>>,
}

/// Sequential step executor
pub struct WorkflowEngine<C> {
    /// Steps of the latest run that completed, in execution order
    ledger: Vec<LedgerEntry<C>>,

    /// Per-step outcomes of the latest run
    history: Vec<ExecutionRecord>,
}

impl<C: Send> Default for WorkflowEngine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send> WorkflowEngine<C> {
    pub fn new() -> Self {
        Self {
            ledger: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Run `steps` in order against `ctx`, returning the last step's result.
    ///
    /// An empty sequence returns `Ok(None)` and leaves the previous run's
    /// ledger and history untouched.
    #[instrument(skip_all, fields(steps = steps.len()))]
    pub async fn execute(
        &mut self,
        steps: Vec<Arc<dyn Step<C>>>,
        ctx: &mut C,
    ) -> Result<Option<Value>, WorkflowError> {
        if steps.is_empty() {
            debug!("Empty workflow, nothing to execute");
            return Ok(None);
        }

        self.ledger.clear();
        self.history.clear();

        let mut last_result = None;

        for (index, step) in steps.into_iter().enumerate() {
            let name = step.name().to_string();
            debug!(index, step = %name, "Executing step");

            match step.execute(ctx).await {
                Ok(result) => {
                    self.history
                        .push(ExecutionRecord::succeeded(index, &name, result.clone()));
                    self.ledger.push(LedgerEntry { index, step });
                    last_result = Some(result);
                }
                Err(e) => {
                    error!(index, step = %name, error = %e, "Step failed");
                    self.history
                        .push(ExecutionRecord::failed(index, &name, e.to_string()));
                    return Err(WorkflowError::StepFailed {
                        index,
                        name,
                        source: e,
                    });
                }
            }
        }

        info!(completed = self.ledger.len(), "Workflow completed");
        Ok(last_result)
    }

    /// Compensate completed steps in reverse order.
    ///
    /// Every compensating step is attempted even if an earlier one fails;
    /// failures are logged and collected in the report. The ledger is empty
    /// afterwards while the execution history is kept.
    #[instrument(skip_all, fields(steps = self.ledger.len()))]
    pub async fn rollback(&mut self) -> RollbackReport {
        let mut report = RollbackReport::default();

        for entry in self.ledger.iter().rev() {
            let Some(undo) = entry.step.compensation() else {
                continue;
            };

            report.attempted += 1;
            let name = entry.step.name();
            debug!(index = entry.index, step = %name, "Rolling back step");

            if let Err(e) = undo.await {
                warn!(index = entry.index, step = %name, error = %e, "Rollback failed for step");
                report.failures.push(RollbackFailure {
                    step_index: entry.index,
                    step_name: name.to_string(),
                    error: e.to_string(),
                });
            }
        }

        self.ledger.clear();
        info!(
            attempted = report.attempted,
            failed = report.failures.len(),
            "Rollback finished"
        );
        report
    }

    /// Copy of the latest run's per-step outcomes
    pub fn get_execution_history(&self) -> Vec<ExecutionRecord> {
        self.history.clone()
    }

    /// Number of steps currently eligible for rollback
    pub fn executed_steps(&self) -> usize {
        self.ledger.len()
    }

    /// Forget the ledger and the history
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.history.clear();
    }
}

/// Workflow execution errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Step {index} ('{name}') failed")]
    StepFailed {
        index: usize,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WorkflowError {
    /// Index of the failing step
    pub fn step_index(&self) -> usize {
        match self {
            Self::StepFailed { index, .. } => *index,
        }
    }
}
