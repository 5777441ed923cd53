//! Configuration for aegis.
//!
//! Configuration sources (highest priority first):
//! 1. Explicit path (`--config`) or the `AEGIS_CONFIG` environment variable
//! 2. `.aegis/config.yaml` in the current directory or any parent
//! 3. `~/.aegis/config.yaml`
//! 4. Built-in defaults (init -> processing -> completed, 10 snapshots)
//!
//! Example file:
//!
//! ```yaml
//! version: "1.0"
//! lifecycle:
//!   stages: [init, processing, completed]
//!   initial: init
//!   transitions:
//!     init: [processing]
//!     processing: [completed]
//! state:
//!   max_snapshots: 20
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::core::StateStoreConfig;
use crate::domain::{Lifecycle, LifecycleError};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "AEGIS_CONFIG";

/// Directory holding the project config file
pub const CONFIG_DIR: &str = ".aegis";

/// Config file name inside `CONFIG_DIR`
pub const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub lifecycle: Option<Lifecycle>,
    #[serde(default)]
    pub state: StateStoreConfig,
}

/// Configuration with defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Lifecycle driven by the stage orchestrator
    pub lifecycle: Lifecycle,
    /// State store options
    pub state: StateStoreConfig,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            state: StateStoreConfig::default(),
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    /// Build from a parsed file, validating the lifecycle
    pub fn from_file(file: ConfigFile, path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let lifecycle = file.lifecycle.unwrap_or_default();
        lifecycle.validate().map_err(|source| ConfigError::Lifecycle {
            path: path.clone().unwrap_or_default(),
            source,
        })?;

        Ok(Self {
            lifecycle,
            state: file.state,
            config_file: path,
        })
    }
}

/// Find `.aegis/config.yaml` in `start` or any of its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .find(|path| path.exists())
}

/// Load and parse a config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Locate the config file following the documented precedence
fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        return Ok(Some(path));
    }

    if let Some(path) = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_file(&cwd))
    {
        return Ok(Some(path));
    }

    Ok(dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
        .filter(|path| path.exists()))
}

/// Load configuration from all sources
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    match discover(explicit)? {
        Some(path) => {
            debug!(path = %path.display(), "Loading config file");
            let file = load_config_file(&path)?;
            ResolvedConfig::from_file(file, Some(path))
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(ResolvedConfig::default())
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid lifecycle in {}", path.display())]
    Lifecycle {
        path: PathBuf,
        #[source]
        source: LifecycleError,
    },
}
