//! aegis - Stage lifecycle, compensating workflow and quality gate core
//!
//! Coordinates a bounded-lifetime unit of work with four independent
//! components:
//!
//! - a stage orchestrator with entry/exit hooks and transition rollback
//! - a workflow engine running ordered steps with reverse-order compensation
//! - a quality pipeline running checks and evaluating gates
//! - a state store with bounded in-memory snapshots
//!
//! Everything is strictly sequential: hooks, steps and checks run one at a
//! time in registration order.
//!
//! # Modules
//!
//! - `adapters`: Capability traits for steps, checks, gates and hooks
//! - `core`: The components themselves
//! - `domain`: Lifecycle definitions and outcome records
//! - `config`: Config file discovery
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Show the configured lifecycle
//! aegis stages
//!
//! # Walk the lifecycle
//! aegis walk processing completed
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use adapters::{Check, CheckOutcome, CompensableStep, FnStep, GateValidator, Hook, Step};
pub use crate::core::{HandlerRegistry, QualityPipeline, StageOrchestrator, StateStore, WorkflowEngine};
pub use domain::{Lifecycle, PipelineReport};
pub use error::{Error, ErrorKind};
