//! Named handler registry with an injectable loader.
//!
//! The registry is an ordinary value owned by the host program. Handlers
//! are registered explicitly at startup, or pulled in bulk from a
//! `HandlerLoader`: any `Fn(&Path)` closure supplied by the host, or the
//! in-memory `StaticLoader`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Source of `(name, handler)` pairs
pub trait HandlerLoader<H> {
    fn load(&self, source: &Path) -> Result<Vec<(String, H)>>;
}

impl<H, F> HandlerLoader<H> for F
where
    F: Fn(&Path) -> Result<Vec<(String, H)>>,
{
    fn load(&self, source: &Path) -> Result<Vec<(String, H)>> {
        (self)(source)
    }
}

/// Loader that ignores the source and yields a fixed set of handlers
pub struct StaticLoader<H> {
    entries: Vec<(String, H)>,
}

impl<H: Clone> StaticLoader<H> {
    pub fn new(entries: impl IntoIterator<Item = (impl Into<String>, H)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, handler)| (name.into(), handler))
                .collect(),
        }
    }
}

impl<H: Clone> HandlerLoader<H> for StaticLoader<H> {
    fn load(&self, _source: &Path) -> Result<Vec<(String, H)>> {
        Ok(self.entries.clone())
    }
}

/// Handlers by name, remembering registration order
pub struct HandlerRegistry<H> {
    handlers: HashMap<String, H>,
    order: Vec<String>,
}

impl<H> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> HandlerRegistry<H> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a handler under a new name
    pub fn register(&mut self, name: impl Into<String>, handler: H) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateHandler(name));
        }

        self.insert(name, handler);
        Ok(())
    }

    /// Pull handlers from `loader`.
    ///
    /// Loaded handlers replace existing ones with the same name. A loader
    /// failure is logged and yields nothing. Returns the number loaded.
    pub fn load_from(&mut self, loader: &dyn HandlerLoader<H>, source: &Path) -> usize {
        let entries = match loader.load(source) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(source = %source.display(), error = %e, "Failed to load handlers");
                return 0;
            }
        };

        let mut loaded = 0;
        for (name, handler) in entries {
            if name.is_empty() {
                warn!(source = %source.display(), "Skipping handler with empty name");
                continue;
            }
            if self.handlers.contains_key(&name) {
                debug!(handler = %name, "Replacing existing handler");
            }
            self.insert(name, handler);
            loaded += 1;
        }

        info!(source = %source.display(), loaded, "Handlers loaded");
        loaded
    }

    /// Handler registered under `name`, if any
    pub fn get(&self, name: &str) -> Option<&H> {
        self.handlers.get(name)
    }

    /// Registered names, in first-registration order
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
        self.order.clear();
    }

    fn insert(&mut self, name: String, handler: H) {
        if self.handlers.insert(name.clone(), handler).is_none() {
            self.order.push(name);
        }
    }
}

/// Registration errors
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Handler already exists: {0}")]
    DuplicateHandler(String),

    #[error("Handler name cannot be empty")]
    EmptyName,
}
