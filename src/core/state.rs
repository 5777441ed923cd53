//! In-memory key-value state with point-in-time snapshots.
//!
//! Snapshots are kept in creation order and evicted oldest-first once
//! their number exceeds the configured cap.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::SnapshotInfo;

/// Default number of retained snapshots
pub const DEFAULT_MAX_SNAPSHOTS: usize = 10;

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStoreConfig {
    /// Maximum number of snapshots retained (default: 10)
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: usize,
}

fn default_max_snapshots() -> usize {
    DEFAULT_MAX_SNAPSHOTS
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            max_snapshots: default_max_snapshots(),
        }
    }
}

/// A frozen copy of the state map
#[derive(Debug, Clone)]
struct Snapshot {
    id: String,
    timestamp: DateTime<Utc>,
    state: HashMap<String, Value>,
}

/// Key-value store with snapshot/restore
#[derive(Debug)]
pub struct StateStore {
    state: HashMap<String, Value>,
    snapshots: VecDeque<Snapshot>,
    max_snapshots: usize,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Create a store with the default snapshot cap
    pub fn new() -> Self {
        Self::with_config(StateStoreConfig::default())
    }

    /// Create a store from configuration
    ///
    /// A cap of zero is treated as unset and falls back to the default.
    pub fn with_config(config: StateStoreConfig) -> Self {
        let max_snapshots = if config.max_snapshots == 0 {
            warn!(
                default = DEFAULT_MAX_SNAPSHOTS,
                "max_snapshots must be positive, using default"
            );
            DEFAULT_MAX_SNAPSHOTS
        } else {
            config.max_snapshots
        };

        Self {
            state: HashMap::new(),
            snapshots: VecDeque::new(),
            max_snapshots,
        }
    }

    /// Configured snapshot cap
    pub fn max_snapshots(&self) -> usize {
        self.max_snapshots
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.insert(key.into(), value.into());
    }

    /// Value stored under `key`, or `None` when absent
    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn has_state(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// Remove `key`; missing keys are ignored
    pub fn remove_state(&mut self, key: &str) {
        self.state.remove(key);
    }

    pub fn clear_state(&mut self) {
        self.state.clear();
    }

    /// Live keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Capture the current map and return the new snapshot id
    pub fn snapshot(&mut self) -> String {
        let id = format!("snapshot_{}", Uuid::new_v4().simple());

        self.snapshots.push_back(Snapshot {
            id: id.clone(),
            timestamp: Utc::now(),
            state: self.state.clone(),
        });

        while self.snapshots.len() > self.max_snapshots {
            if let Some(evicted) = self.snapshots.pop_front() {
                debug!(snapshot = %evicted.id, "Evicted oldest snapshot");
            }
        }

        debug!(snapshot = %id, keys = self.state.len(), "Snapshot taken");
        id
    }

    /// Replace the live map with a copy of the snapshot `id`
    pub fn restore(&mut self, id: &str) -> Result<(), StateError> {
        let snapshot = self
            .snapshots
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StateError::SnapshotNotFound(id.to_string()))?;

        self.state = snapshot.state.clone();
        debug!(snapshot = %id, keys = self.state.len(), "State restored");
        Ok(())
    }

    /// Snapshot ids and timestamps in creation order
    pub fn list_snapshots(&self) -> Vec<SnapshotInfo> {
        self.snapshots
            .iter()
            .map(|s| SnapshotInfo {
                id: s.id.clone(),
                timestamp: s.timestamp,
            })
            .collect()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}

/// State store errors
#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}
