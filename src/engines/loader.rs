//! Engine loader for initializing engines from configuration

use super::client::HttpEngineClient;
use super::registry::EngineRegistry;
use super::serpapi::SerpApi;
use super::traits::{Engine, EngineSpec};
use super::{arxiv, bing, duckduckgo, google, wikipedia};
use crate::cache::HitCache;
use crate::config::{EngineConfig, Settings};
use crate::network::HttpClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing engines from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Build the registry for every enabled engine in the settings
    ///
    /// Engines of an unknown type are skipped with a warning; a missing
    /// default engine is an error.
    pub fn load(
        settings: &Settings,
        client: HttpClient,
        cache: Option<Arc<HitCache>>,
    ) -> Result<EngineRegistry> {
        let mut registry = EngineRegistry::new(settings.default_engine.clone());

        for config in &settings.engines {
            if config.disabled {
                info!("Skipping disabled engine: {}", config.name);
                continue;
            }

            let engine = match Self::create_engine(&config.engine, config) {
                Ok(engine) => engine,
                Err(e) => {
                    warn!("Failed to load engine {}: {}", config.name, e);
                    continue;
                }
            };

            let spec = Self::spec_for(settings, config, engine.as_ref());
            let mut http = HttpEngineClient::new(config.name.clone(), engine, client.clone())
                .requires_credential(spec.requires_credential)
                .with_api_key(settings.api_key(&config.name).map(str::to_string))
                .fetch_content(settings.search.fetch_page_content);
            if let Some(ref cache) = cache {
                http = http.with_cache(cache.clone());
            }

            info!(
                "Loaded engine: {} ({}, {})",
                config.name,
                config.engine,
                if spec.requires_credential { "paid" } else { "free" }
            );
            registry.register(spec, Arc::new(http));
        }

        registry
            .validate()
            .context("engine registry is incomplete")?;
        info!("Loaded {} engines", registry.len());
        Ok(registry)
    }

    /// Paid/free comes from the configured sets, falling back to the backend
    fn spec_for(settings: &Settings, config: &EngineConfig, engine: &dyn Engine) -> EngineSpec {
        let id = config.name.clone();
        if settings.paid_engines.contains(&id) {
            EngineSpec::paid(id)
        } else if settings.free_engines.contains(&id) {
            EngineSpec::free(id)
        } else if engine.about().require_api_key {
            EngineSpec::paid(id)
        } else {
            EngineSpec::free(id)
        }
    }

    /// Create an engine instance by backend type
    fn create_engine(engine_type: &str, config: &EngineConfig) -> Result<Arc<dyn Engine>> {
        let mut engine: Box<dyn Engine> = match engine_type {
            "duckduckgo" => Box::new(duckduckgo::DuckDuckGo::new()),
            "wikipedia" => Box::new(wikipedia::Wikipedia::new()),
            "arxiv" => Box::new(arxiv::ArXiv::new()),
            "google" => Box::new(google::Google::new()),
            "bing" => Box::new(bing::Bing::new()),
            "serpapi" => Box::new(SerpApi::web()),
            "serpapi_scholar" => Box::new(SerpApi::scholar()),
            _ => {
                return Err(anyhow::anyhow!("Unknown engine type: {}", engine_type));
            }
        };

        engine.init(config)?;

        Ok(Arc::from(engine))
    }

    /// Get list of available engine types
    pub fn available_engines() -> Vec<&'static str> {
        vec![
            "duckduckgo",
            "wikipedia",
            "arxiv",
            "google",
            "bing",
            "serpapi",
            "serpapi_scholar",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_load_defaults() {
        let settings = Settings::default();
        let registry = EngineLoader::load(&settings, HttpClient::new().unwrap(), None).unwrap();

        assert_eq!(registry.len(), 7);
        assert_eq!(registry.default_engine(), "ddg");
        assert!(registry.is_free("arxiv"));
        assert!(registry.is_paid("scholar"));
        assert_eq!(
            registry.usable_engines(&HashSet::new()),
            vec!["arxiv", "ddg", "wikipedia"]
        );
    }

    #[test]
    fn test_unknown_type_skipped_and_missing_default_rejected() {
        let mut settings = Settings::default();
        settings.engines = vec![
            EngineConfig::new("ddg", "duckduckgo"),
            EngineConfig::new("yahoo", "yahoo"),
        ];
        let registry = EngineLoader::load(&settings, HttpClient::new().unwrap(), None).unwrap();
        assert_eq!(registry.names(), vec!["ddg"]);

        settings.default_engine = "yahoo".to_string();
        assert!(EngineLoader::load(&settings, HttpClient::new().unwrap(), None).is_err());
    }

    #[test]
    fn test_unlisted_engine_uses_backend_metadata() {
        let mut settings = Settings::default();
        settings.engines.push(EngineConfig::new("bing2", "bing"));
        let registry = EngineLoader::load(&settings, HttpClient::new().unwrap(), None).unwrap();
        assert!(registry.is_paid("bing2"));
    }
}
