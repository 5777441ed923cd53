//! Domain types for the aegis core.
//!
//! This module contains the plain data shared by the components:
//! - Lifecycle: stage set and transition table
//! - Records: execution, check, gate and snapshot outcomes

pub mod lifecycle;
pub mod records;

// Re-export commonly used types
pub use lifecycle::{Lifecycle, LifecycleError};
pub use records::{
    CheckRecord, ExecutionRecord, FailedGate, GateReport, HookPhase, PipelineReport,
    RollbackFailure, RollbackReport, SnapshotInfo,
};
