//! Crate-wide error aggregate.
//!
//! Each component returns its own error enum. `Error` collects them for
//! callers that drive several components, and `ErrorKind` classifies any
//! of them into the failure categories callers usually branch on.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{OrchestratorError, QualityError, RegistryError, StateError, WorkflowError};
use crate::domain::LifecycleError;

/// Broad failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input or configuration
    Validation,
    /// Name collision on registration
    Duplicate,
    /// Operation not valid in the current lifecycle state
    State,
    /// Lookup miss
    NotFound,
    /// A step or check failed
    Execution,
    /// An entry or exit hook failed
    Hook,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Duplicate => "duplicate",
            Self::State => "state",
            Self::NotFound => "not_found",
            Self::Execution => "execution",
            Self::Hook => "hook",
        };
        f.write_str(name)
    }
}

/// Any error produced by the core components
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Quality(#[from] QualityError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Orchestrator(OrchestratorError::HookFailed { .. }) => ErrorKind::Hook,
            Self::Orchestrator(_) => ErrorKind::State,
            Self::Workflow(WorkflowError::StepFailed { .. }) => ErrorKind::Execution,
            Self::Quality(QualityError::DuplicateCheck(_)) => ErrorKind::Duplicate,
            Self::State(StateError::SnapshotNotFound(_)) => ErrorKind::NotFound,
            Self::Registry(RegistryError::DuplicateHandler(_)) => ErrorKind::Duplicate,
            Self::Registry(RegistryError::EmptyName) => ErrorKind::Validation,
            Self::Lifecycle(_) | Self::Config(_) => ErrorKind::Validation,
        }
    }
}

/// Convenience alias for results carrying the aggregate error
pub type Result<T, E = Error> = std::result::Result<T, E>;
