//! Settings structures for deepsearch-rs configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Main settings structure, loaded once from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub oracle: OracleSettings,
    /// API keys by engine id
    pub api_keys: HashMap<String, String>,
    /// Engine used when a request names none
    pub default_engine: String,
    /// Engines that work without an API key
    pub free_engines: Vec<String>,
    /// Engines that require an API key
    pub paid_engines: Vec<String>,
    /// Engine instances to construct
    pub engines: Vec<EngineConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            search: SearchSettings::default(),
            outgoing: OutgoingSettings::default(),
            oracle: OracleSettings::default(),
            api_keys: HashMap::new(),
            default_engine: "ddg".to_string(),
            free_engines: vec!["ddg".into(), "wikipedia".into(), "arxiv".into()],
            paid_engines: vec![
                "google".into(),
                "bing".into(),
                "serp".into(),
                "scholar".into(),
            ],
            engines: default_engines(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (DEEPSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("DEEPSEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = lookup("DEEPSEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("DEEPSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = lookup("DEEPSEARCH_DEFAULT_ENGINE") {
            self.default_engine = val;
        }
        if let Some(val) = lookup("DEEPSEARCH_LOG_DIR") {
            self.general.log_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("DEEPSEARCH_ORACLE_ENDPOINT") {
            self.oracle.endpoint = val;
        }
        if let Some(val) = lookup("DEEPSEARCH_ORACLE_MODEL") {
            self.oracle.model = val;
        }
        if let Some(val) = lookup("DEEPSEARCH_ORACLE_API_KEY") {
            self.oracle.api_key = Some(val);
        }

        // Per-engine keys, e.g. DEEPSEARCH_API_KEY_GOOGLE
        let ids: Vec<String> = self.engine_ids().into_iter().collect();
        for id in ids {
            let var = format!("DEEPSEARCH_API_KEY_{}", id.to_uppercase());
            if let Some(key) = lookup(&var) {
                self.api_keys.insert(id, key);
            }
        }
    }

    /// Check invariants that the engine registry relies on
    pub fn validate(&self) -> Result<()> {
        let free: HashSet<&str> = self.free_engines.iter().map(String::as_str).collect();
        let overlap: Vec<&str> = self
            .paid_engines
            .iter()
            .map(String::as_str)
            .filter(|id| free.contains(id))
            .collect();
        if !overlap.is_empty() {
            bail!(
                "engines cannot be both free and paid: {}",
                overlap.join(", ")
            );
        }
        if self.default_engine.trim().is_empty() {
            bail!("default_engine must not be empty");
        }
        if self.search.timeout == 0 {
            bail!("search.timeout must be at least one second");
        }
        Ok(())
    }

    /// Engine ids with a non-empty configured API key
    pub fn available_credentials(&self) -> HashSet<String> {
        self.api_keys
            .iter()
            .filter(|(_, key)| !key.trim().is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Configured API key for an engine
    pub fn api_key(&self, id: &str) -> Option<&str> {
        self.api_keys
            .get(id)
            .map(String::as_str)
            .filter(|key| !key.trim().is_empty())
    }

    /// Get engine config by name
    pub fn get_engine(&self, name: &str) -> Option<&EngineConfig> {
        self.engines.iter().find(|e| e.name == name)
    }

    /// Get all enabled engines
    pub fn enabled_engines(&self) -> Vec<&EngineConfig> {
        self.engines.iter().filter(|e| !e.disabled).collect()
    }

    /// Every engine id mentioned anywhere in the settings
    fn engine_ids(&self) -> HashSet<String> {
        self.free_engines
            .iter()
            .chain(self.paid_engines.iter())
            .cloned()
            .chain(self.engines.iter().map(|e| e.name.clone()))
            .collect()
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the API
    pub instance_name: String,
    /// Enable metrics collection
    pub enable_metrics: bool,
    /// Directory for per-session search logs (disabled when unset)
    pub log_dir: Option<PathBuf>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "deepsearch-rs".to_string(),
            enable_metrics: true,
            log_dir: None,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Deep-search defaults and budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Rounds per session when the request does not say
    pub max_iterations: i64,
    /// Results requested per engine call
    pub depth: i64,
    /// Per engine call timeout in seconds
    pub timeout: u64,
    /// Query several engines per round
    pub fan_out: bool,
    /// Engines used in fan-out mode (empty = every usable engine)
    pub fan_out_engines: Vec<String>,
    /// Shared fan-out round deadline in seconds (default: two call timeouts)
    pub round_deadline: Option<f64>,
    /// Overall wall-clock budget per session in seconds
    pub session_budget: Option<f64>,
    /// Replace snippets with text extracted from each result page; the
    /// engine snippet is kept when a page cannot be fetched
    pub fetch_page_content: bool,
    /// Engine response cache TTL in seconds (0 disables caching)
    pub cache_ttl: u64,
    /// Maximum cached engine responses
    pub cache_capacity: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            depth: 5,
            timeout: 30,
            fan_out: false,
            fan_out_engines: vec![],
            round_deadline: None,
            session_budget: None,
            fetch_page_content: true,
            cache_ttl: 300,
            cache_capacity: 1000,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Sufficiency oracle backend (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// Chat completions endpoint
    pub endpoint: String,
    /// Model name sent with each request
    pub model: String,
    /// Bearer token, if the endpoint needs one
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Snippet characters per result included in prompts
    pub max_snippet_chars: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "llama3.1".to_string(),
            api_key: None,
            temperature: 0.2,
            timeout: 120,
            max_snippet_chars: 1000,
        }
    }
}

/// Individual engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine id (unique identifier used in requests)
    pub name: String,
    /// Backend implementation to use
    pub engine: String,
    /// Whether engine is disabled
    pub disabled: bool,
    /// Override the backend's base URL
    pub base_url: Option<String>,
    /// Additional engine-specific settings (e.g. Google `cx`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl EngineConfig {
    pub fn new(name: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: engine.into(),
            ..Default::default()
        }
    }

    /// Read a string-valued extra setting
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            disabled: false,
            base_url: None,
            extra: HashMap::new(),
        }
    }
}

/// Default engine configurations
fn default_engines() -> Vec<EngineConfig> {
    vec![
        EngineConfig::new("ddg", "duckduckgo"),
        EngineConfig::new("wikipedia", "wikipedia"),
        EngineConfig::new("arxiv", "arxiv"),
        EngineConfig::new("google", "google"),
        EngineConfig::new("bing", "bing"),
        EngineConfig::new("serp", "serpapi"),
        EngineConfig::new("scholar", "serpapi_scholar"),
    ]
}
