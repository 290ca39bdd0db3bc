//! Configuration module for deepsearch-rs
//!
//! Handles loading and validating settings from YAML files and environment
//! variables. Settings are loaded once at startup and shared read-only.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "DEEPSEARCH_SETTINGS_PATH";

/// Load settings from the first file found, or use defaults
///
/// `explicit` (from the command line) wins over `DEEPSEARCH_SETTINGS_PATH`,
/// which wins over the default locations. Environment overrides are applied
/// last and the result is validated.
pub fn load(explicit: Option<PathBuf>) -> Result<Settings> {
    let mut settings = match find_settings_file(explicit) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

fn find_settings_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }

    if let Ok(path) = std::env::var(SETTINGS_PATH_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/deepsearch/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("deepsearch-rs/settings.yml"));
    }

    paths.into_iter().find(|p| p.exists())
}
