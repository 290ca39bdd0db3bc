//! Engine registry for resolving engine identifiers to clients

use super::traits::{EngineClient, EngineId, EngineSpec};
use crate::error::SearchError;
use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

struct RegisteredEngine {
    spec: EngineSpec,
    client: Arc<dyn EngineClient>,
}

/// Registry of all available search engines
///
/// Built once at startup and shared read-only afterwards.
pub struct EngineRegistry {
    engines: HashMap<EngineId, RegisteredEngine>,
    default_engine: EngineId,
}

impl EngineRegistry {
    /// Create an empty registry with the given default engine
    pub fn new(default_engine: impl Into<EngineId>) -> Self {
        Self {
            engines: HashMap::new(),
            default_engine: default_engine.into(),
        }
    }

    /// Register an engine, replacing any previous one with the same id
    pub fn register(&mut self, spec: EngineSpec, client: Arc<dyn EngineClient>) {
        self.engines
            .insert(spec.id.clone(), RegisteredEngine { spec, client });
    }

    /// Check that the default engine is registered
    pub fn validate(&self) -> Result<()> {
        if !self.engines.contains_key(&self.default_engine) {
            bail!(
                "default engine '{}' is not registered (available: {})",
                self.default_engine,
                self.names().join(", ")
            );
        }
        Ok(())
    }

    /// Get an engine client by id
    pub fn get(&self, id: &str) -> Option<&Arc<dyn EngineClient>> {
        self.engines.get(id).map(|e| &e.client)
    }

    pub fn spec(&self, id: &str) -> Option<&EngineSpec> {
        self.engines.get(id).map(|e| &e.spec)
    }

    /// Check if an engine exists
    pub fn contains(&self, id: &str) -> bool {
        self.engines.contains_key(id)
    }

    /// All engine ids, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    /// Pick the engine for a session
    ///
    /// A registered engine is returned even when it has no credential; the
    /// client reports `AuthFailed` when it is called.
    pub fn resolve_engine(
        &self,
        requested: Option<&str>,
        available_credentials: &HashSet<String>,
    ) -> Result<EngineId, SearchError> {
        let requested = requested.map(str::trim).filter(|id| !id.is_empty());

        let Some(id) = requested else {
            return Ok(self.default_engine.clone());
        };

        if !self.contains(id) {
            return Err(SearchError::invalid_input(format!(
                "Unknown search engine '{}'. Available engines: {}",
                id,
                self.names().join(", ")
            )));
        }

        if self.is_paid(id) && !self.has_credential(id, available_credentials) {
            warn!("Engine {} requires an API key which is not configured", id);
        }

        Ok(id.to_string())
    }

    pub fn is_free(&self, id: &str) -> bool {
        self.spec(id).map(|s| !s.requires_credential).unwrap_or(false)
    }

    pub fn is_paid(&self, id: &str) -> bool {
        self.spec(id).map(|s| s.requires_credential).unwrap_or(false)
    }

    /// Whether `id` can be called with the given credentials
    pub fn has_credential(&self, id: &str, available_credentials: &HashSet<String>) -> bool {
        self.is_free(id) || (self.is_paid(id) && available_credentials.contains(id))
    }

    /// Free engines plus paid engines that have a credential, sorted
    pub fn usable_engines(&self, available_credentials: &HashSet<String>) -> Vec<EngineId> {
        self.names()
            .into_iter()
            .filter(|id| self.has_credential(id, available_credentials))
            .map(str::to_string)
            .collect()
    }
}
