//! Application state shared across handlers

use crate::cache::HitCache;
use crate::config::Settings;
use crate::engines::EngineRegistry;
use crate::metrics::Metrics;
use crate::search::DeepSearch;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Session orchestrator
    pub search: Arc<DeepSearch>,
    pub metrics: Arc<Metrics>,
    /// Engine response cache, when enabled
    pub cache: Option<Arc<HitCache>>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Arc<Settings>, search: Arc<DeepSearch>, metrics: Arc<Metrics>) -> Self {
        Self {
            settings,
            search,
            metrics,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<HitCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        self.search.registry()
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
