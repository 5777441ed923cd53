//! Command-line interface for aegis.
//!
//! Provides commands for inspecting the configured lifecycle, walking it
//! stage by stage, and showing the resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{self, ResolvedConfig};
use crate::core::{StageOrchestrator, StateStore};

/// aegis - Stage lifecycle, workflow and quality gate core
#[derive(Parser, Debug)]
#[command(name = "aegis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (overrides discovery of .aegis/config.yaml)
    #[arg(short, long, global = true, env = config::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the configured stages and transitions
    Stages,

    /// Initialize the lifecycle and transition through the given stages
    Walk {
        /// Target stages, in order
        #[arg(required = true)]
        targets: Vec<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load_config(self.config.as_deref())
            .context("Failed to load configuration")?;

        match self.command {
            Commands::Stages => show_stages(&cfg),
            Commands::Walk { targets } => walk(&cfg, &targets).await,
            Commands::Config => show_config(&cfg),
        }
    }
}

/// Print stages in lifecycle order with their outgoing transitions
fn show_stages(cfg: &ResolvedConfig) -> Result<()> {
    let lifecycle = &cfg.lifecycle;

    println!("Initial stage: {}", lifecycle.initial);
    println!();
    for stage in &lifecycle.stages {
        if lifecycle.is_terminal(stage) {
            println!("  {} (terminal)", stage);
        } else {
            println!("  {} -> {}", stage, lifecycle.targets(stage).join(", "));
        }
    }

    Ok(())
}

/// Walk the lifecycle, checkpointing the state store on every stage entry
async fn walk(cfg: &ResolvedConfig, targets: &[String]) -> Result<()> {
    let mut orchestrator = StageOrchestrator::with_lifecycle(cfg.lifecycle.clone())
        .context("Invalid lifecycle")?;
    let store = Arc::new(Mutex::new(StateStore::with_config(cfg.state.clone())));

    for stage in orchestrator.get_stages() {
        let exiting = stage.clone();
        orchestrator.on_exit(&stage, move || {
            let stage = exiting.clone();
            async move {
                info!(%stage, "Leaving stage");
                anyhow::Ok(())
            }
        })?;

        let entering = stage.clone();
        let store = Arc::clone(&store);
        orchestrator.on_enter(&stage, move || {
            let stage = entering.clone();
            let store = Arc::clone(&store);
            async move {
                let mut store = store.lock().await;
                store.set_state("stage", json!(stage));
                let id = store.snapshot();
                info!(%stage, snapshot = %id, "Entered stage");
                anyhow::Ok(())
            }
        })?;
    }

    orchestrator.initialize().await?;

    for target in targets {
        orchestrator
            .transition(target)
            .await
            .with_context(|| format!("Transition to '{}' rejected", target))?;
    }

    println!("History: {}", orchestrator.get_stage_history().join(" -> "));
    if orchestrator.is_terminal() {
        println!("Reached terminal stage");
    }

    let store = store.lock().await;
    println!();
    println!("Checkpoints ({}):", store.snapshot_count());
    for snapshot in store.list_snapshots() {
        println!("  {}  {}", snapshot.timestamp.to_rfc3339(), snapshot.id);
    }

    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Lifecycle:");
    println!("  Stages:  {}", cfg.lifecycle.stages.join(", "));
    println!("  Initial: {}", cfg.lifecycle.initial);
    println!();
    println!("State store:");
    println!("  Max snapshots: {}", cfg.state.max_snapshots);

    Ok(())
}
