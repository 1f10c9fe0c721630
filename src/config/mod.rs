// Configuration module

mod models;

pub use models::*;

use crate::error::{Result, TriageError};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file
    /// 3. Defaults (lowest)
    ///
    /// The one required credential may also arrive as a bare `GEMINI_API_KEY`
    /// variable, which fills the slot only when nothing else set it.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(File::with_name(&Self::default_config_path()).required(false))
            // Override with environment variables (prefix: PHISHLENS_)
            .add_source(Environment::with_prefix("PHISHLENS").separator("__"))
            .build()
            .map_err(|e| TriageError::Config(e.to_string()))?;

        let mut config: AppConfig = config
            .try_deserialize()
            .map_err(|e| TriageError::Config(e.to_string()))?;

        if config.gemini.api_key.is_empty() {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                config.gemini.api_key = key;
            }
        }

        Ok(config)
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".phishlens")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
