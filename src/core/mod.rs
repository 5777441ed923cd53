//! Core coordination components.
//!
//! This module contains:
//! - StageOrchestrator: lifecycle stages, transitions and hooks
//! - WorkflowEngine: ordered steps with compensating rollback
//! - QualityPipeline: checks and acceptance gates
//! - StateStore: key-value state with snapshots
//! - HandlerRegistry: named handlers with an injectable loader
//!
//! The components are independent of each other; callers wire them
//! together (typically from orchestrator hooks).

pub mod orchestrator;
pub mod quality;
pub mod registry;
pub mod state;
pub mod workflow;

// Re-export commonly used types
pub use orchestrator::{OrchestratorError, StageOrchestrator};
pub use quality::{QualityError, QualityPipeline, VALIDATOR_REJECTED};
pub use registry::{HandlerLoader, HandlerRegistry, RegistryError, StaticLoader};
pub use state::{StateError, StateStore, StateStoreConfig, DEFAULT_MAX_SNAPSHOTS};
pub use workflow::{WorkflowEngine, WorkflowError};
