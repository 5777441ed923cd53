//! Lifecycle definitions: the stage set and its transition table.
//!
//! Lifecycles are plain data and can be loaded from YAML:
//!
//! ```yaml
//! stages: [init, processing, completed]
//! initial: init
//! transitions:
//!   init: [processing]
//!   processing: [completed]
//! ```
//!
//! A stage with no outgoing transitions is terminal.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default stage names
pub const STAGE_INIT: &str = "init";
pub const STAGE_PROCESSING: &str = "processing";
pub const STAGE_COMPLETED: &str = "completed";

/// A fixed stage set with its allowed stage -> stage edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Declared stages, in display order
    pub stages: Vec<String>,

    /// Stage entered by `initialize`
    pub initial: String,

    /// Source stage -> permitted target stages
    #[serde(default)]
    pub transitions: BTreeMap<String, Vec<String>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        let mut transitions = BTreeMap::new();
        transitions.insert(STAGE_INIT.to_string(), vec![STAGE_PROCESSING.to_string()]);
        transitions.insert(
            STAGE_PROCESSING.to_string(),
            vec![STAGE_COMPLETED.to_string()],
        );
        transitions.insert(STAGE_COMPLETED.to_string(), Vec::new());

        Self {
            stages: vec![
                STAGE_INIT.to_string(),
                STAGE_PROCESSING.to_string(),
                STAGE_COMPLETED.to_string(),
            ],
            initial: STAGE_INIT.to_string(),
            transitions,
        }
    }
}

impl Lifecycle {
    /// Build a lifecycle from stage names and edges
    pub fn new<S: Into<String>>(
        stages: impl IntoIterator<Item = S>,
        initial: impl Into<String>,
        edges: impl IntoIterator<Item = (S, S)>,
    ) -> Self {
        let mut transitions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (from, to) in edges {
            transitions.entry(from.into()).or_default().push(to.into());
        }

        Self {
            stages: stages.into_iter().map(Into::into).collect(),
            initial: initial.into(),
            transitions,
        }
    }

    /// Parse a lifecycle from YAML content
    pub fn from_yaml(content: &str) -> Result<Self, LifecycleError> {
        let lifecycle: Self = serde_yaml::from_str(content)?;
        lifecycle.validate()?;
        Ok(lifecycle)
    }

    /// Validate the lifecycle definition
    pub fn validate(&self) -> Result<(), LifecycleError> {
        if self.stages.is_empty() {
            return Err(LifecycleError::NoStages);
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.is_empty() {
                return Err(LifecycleError::EmptyStageName);
            }
            if !seen.insert(stage.as_str()) {
                return Err(LifecycleError::DuplicateStage(stage.clone()));
            }
        }

        if !self.contains(&self.initial) {
            return Err(LifecycleError::UnknownInitial(self.initial.clone()));
        }

        for (from, targets) in &self.transitions {
            if !self.contains(from) {
                return Err(LifecycleError::UnknownSource(from.clone()));
            }
            for to in targets {
                if !self.contains(to) {
                    return Err(LifecycleError::UnknownTarget {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
                if to == from {
                    return Err(LifecycleError::SelfLoop(from.clone()));
                }
            }
        }

        Ok(())
    }

    /// Whether `stage` is declared
    pub fn contains(&self, stage: &str) -> bool {
        self.stages.iter().any(|s| s == stage)
    }

    /// Stages reachable in one transition from `stage`
    pub fn targets(&self, stage: &str) -> &[String] {
        self.transitions
            .get(stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `from -> to` is a declared edge
    pub fn allows(&self, from: &str, to: &str) -> bool {
        self.targets(from).iter().any(|t| t == to)
    }

    /// A stage is terminal when it has no outgoing edges
    pub fn is_terminal(&self, stage: &str) -> bool {
        self.targets(stage).is_empty()
    }
}

/// Malformed lifecycle definitions
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Lifecycle must declare at least one stage")]
    NoStages,

    #[error("Stage names cannot be empty")]
    EmptyStageName,

    #[error("Duplicate stage: {0}")]
    DuplicateStage(String),

    #[error("Initial stage is not declared: {0}")]
    UnknownInitial(String),

    #[error("Transition source is not declared: {0}")]
    UnknownSource(String),

    #[error("Transition target is not declared: {from} -> {to}")]
    UnknownTarget { from: String, to: String },

    #[error("Stage cannot transition to itself: {0}")]
    SelfLoop(String),

    #[error("Failed to parse lifecycle: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifecycle() {
        let lifecycle = Lifecycle::default();

        assert!(lifecycle.validate().is_ok());
        assert_eq!(lifecycle.initial, "init");
        assert!(lifecycle.allows("init", "processing"));
        assert!(lifecycle.allows("processing", "completed"));
        assert!(!lifecycle.allows("init", "completed"));
        assert!(lifecycle.is_terminal("completed"));
        assert!(!lifecycle.is_terminal("init"));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
stages: [draft, review, published, archived]
initial: draft
transitions:
  draft: [review]
  review: [draft, published]
  published: [archived]
"#;

        let lifecycle = Lifecycle::from_yaml(yaml).unwrap();
        assert_eq!(lifecycle.stages.len(), 4);
        assert_eq!(lifecycle.targets("review"), ["draft", "published"]);
        assert!(lifecycle.is_terminal("archived"));
    }

    #[test]
    fn test_validation_rejects_bad_tables() {
        let unknown_initial = Lifecycle::new(["a", "b"], "c", [("a", "b")]);
        assert!(matches!(
            unknown_initial.validate(),
            Err(LifecycleError::UnknownInitial(_))
        ));

        let unknown_target = Lifecycle::new(["a", "b"], "a", [("a", "z")]);
        assert!(matches!(
            unknown_target.validate(),
            Err(LifecycleError::UnknownTarget { .. })
        ));

        let self_loop = Lifecycle::new(["a", "b"], "a", [("a", "a")]);
        assert!(matches!(
            self_loop.validate(),
            Err(LifecycleError::SelfLoop(_))
        ));

        let duplicate = Lifecycle::new(["a", "a"], "a", []);
        assert!(matches!(
            duplicate.validate(),
            Err(LifecycleError::DuplicateStage(_))
        ));
    }
}
