//! Stage orchestrator for a fixed lifecycle.
//!
//! Coordinates stage transitions, lifecycle hooks and the history of
//! entered stages. A transition runs in three phases:
//! 1. exit hooks of the current stage (failure leaves everything unchanged)
//! 2. stage pointer update + history append
//! 3. entry hooks of the new stage (failure reverts phase 2)

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::adapters::Hook;
use crate::domain::{HookPhase, Lifecycle, LifecycleError};

/// Ordered hooks per stage
type HookTable = HashMap<String, Vec<Arc<dyn Hook>>>;

/// Lifecycle driver with entry/exit hooks
pub struct StageOrchestrator {
    lifecycle: Lifecycle,

    /// `None` until `initialize` is called
    current: Option<String>,

    /// Stages actually entered, starting with the initial stage
    history: Vec<String>,

    on_enter: HookTable,
    on_exit: HookTable,
}

impl Default for StageOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl StageOrchestrator {
    /// Create an orchestrator over the default init -> processing -> completed lifecycle
    pub fn new() -> Self {
        Self::from_valid(Lifecycle::default())
    }

    /// Create an orchestrator over a custom lifecycle
    pub fn with_lifecycle(lifecycle: Lifecycle) -> Result<Self, LifecycleError> {
        lifecycle.validate()?;
        Ok(Self::from_valid(lifecycle))
    }

    fn from_valid(lifecycle: Lifecycle) -> Self {
        Self {
            lifecycle,
            current: None,
            history: Vec::new(),
            on_enter: HashMap::new(),
            on_exit: HashMap::new(),
        }
    }

    /// Enter the initial stage. No hooks run.
    pub async fn initialize(&mut self) -> Result<(), OrchestratorError> {
        if self.current.is_some() {
            return Err(OrchestratorError::AlreadyInitialized);
        }

        let initial = self.lifecycle.initial.clone();
        info!(stage = %initial, "Orchestrator initialized");
        self.history = vec![initial.clone()];
        self.current = Some(initial);
        Ok(())
    }

    /// Move from the current stage to `target`
    #[instrument(skip(self), fields(from = self.current.as_deref().unwrap_or("-")))]
    pub async fn transition(&mut self, target: &str) -> Result<(), OrchestratorError> {
        let from = self
            .current
            .clone()
            .ok_or(OrchestratorError::NotInitialized)?;

        if !self.lifecycle.contains(target) {
            return Err(OrchestratorError::UnknownStage(target.to_string()));
        }
        if from == target {
            return Err(OrchestratorError::NoSelfTransition(target.to_string()));
        }
        if !self.lifecycle.allows(&from, target) {
            return Err(OrchestratorError::IllegalTransition {
                from,
                to: target.to_string(),
            });
        }

        run_hooks(&self.on_exit, &from, HookPhase::Exit).await?;

        self.current = Some(target.to_string());
        self.history.push(target.to_string());

        if let Err(e) = run_hooks(&self.on_enter, target, HookPhase::Enter).await {
            error!(stage = %target, "Entry hook failed, reverting transition");
            self.history.pop();
            self.current = Some(from);
            return Err(e);
        }

        info!(stage = %target, "Transitioned");
        Ok(())
    }

    /// Current stage, `None` before initialization
    pub fn get_current_stage(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Copy of the entered-stage history
    pub fn get_stage_history(&self) -> Vec<String> {
        self.history.clone()
    }

    /// Declared stages, in lifecycle order
    pub fn get_stages(&self) -> Vec<String> {
        self.lifecycle.stages.clone()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the current stage has no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        self.current
            .as_deref()
            .is_some_and(|stage| self.lifecycle.is_terminal(stage))
    }

    /// Targets reachable from the current stage
    pub fn allowed_transitions(&self) -> Vec<String> {
        self.current
            .as_deref()
            .map(|stage| self.lifecycle.targets(stage).to_vec())
            .unwrap_or_default()
    }

    /// Register a hook run after entering `stage`
    pub fn on_enter(
        &mut self,
        stage: &str,
        hook: impl Hook + 'static,
    ) -> Result<(), OrchestratorError> {
        self.register(HookPhase::Enter, stage, Arc::new(hook))
    }

    /// Register a hook run before leaving `stage`
    pub fn on_exit(
        &mut self,
        stage: &str,
        hook: impl Hook + 'static,
    ) -> Result<(), OrchestratorError> {
        self.register(HookPhase::Exit, stage, Arc::new(hook))
    }

    fn register(
        &mut self,
        phase: HookPhase,
        stage: &str,
        hook: Arc<dyn Hook>,
    ) -> Result<(), OrchestratorError> {
        if !self.lifecycle.contains(stage) {
            return Err(OrchestratorError::UnknownStage(stage.to_string()));
        }

        let table = match phase {
            HookPhase::Enter => &mut self.on_enter,
            HookPhase::Exit => &mut self.on_exit,
        };
        table.entry(stage.to_string()).or_default().push(hook);
        debug!(%stage, %phase, "Hook registered");
        Ok(())
    }
}

/// Run the hooks registered for `stage`, stopping at the first failure
async fn run_hooks(
    table: &HookTable,
    stage: &str,
    phase: HookPhase,
) -> Result<(), OrchestratorError> {
    let Some(hooks) = table.get(stage) else {
        return Ok(());
    };

    for (index, hook) in hooks.iter().enumerate() {
        debug!(%stage, %phase, index, "Running hook");
        hook.call()
            .await
            .map_err(|source| {
                error!(%stage, %phase, index, error = %source, "Hook failed");
                OrchestratorError::HookFailed {
                    stage: stage.to_string(),
                    phase,
                    index,
                    source,
                }
            })?;
    }

    Ok(())
}

/// Stage orchestration errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Orchestrator already initialized")]
    AlreadyInitialized,

    #[error("Orchestrator not initialized")]
    NotInitialized,

    #[error("Stage does not exist: {0}")]
    UnknownStage(String),

    #[error("Cannot transition to the same stage: {0}")]
    NoSelfTransition(String),

    #[error("Invalid stage transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    #[error("{phase} hook #{index} for stage '{stage}' failed")]
    HookFailed {
        stage: String,
        phase: HookPhase,
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_orchestrator_creation() {
        let orchestrator = StageOrchestrator::new();

        assert_eq!(orchestrator.get_current_stage(), None);
        assert!(orchestrator.get_stage_history().is_empty());
        assert_eq!(
            orchestrator.get_stages(),
            vec!["init", "processing", "completed"]
        );
    }

    #[tokio::test]
    async fn test_terminal_and_allowed_transitions() {
        let mut orchestrator = StageOrchestrator::new();
        assert!(orchestrator.allowed_transitions().is_empty());

        orchestrator.initialize().await.unwrap();
        assert_eq!(orchestrator.allowed_transitions(), vec!["processing"]);
        assert!(!orchestrator.is_terminal());

        orchestrator.transition("processing").await.unwrap();
        orchestrator.transition("completed").await.unwrap();
        assert!(orchestrator.is_terminal());
        assert!(orchestrator.allowed_transitions().is_empty());
    }

    #[test]
    fn test_invalid_lifecycle_rejected() {
        let lifecycle = Lifecycle::new(["a"], "missing", []);
        assert!(StageOrchestrator::with_lifecycle(lifecycle).is_err());
    }
}
