//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use carelink_core::LanguageMode;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote instruction service configuration
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Narration configuration
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Speech recognition configuration
    #[serde(default)]
    pub recognition: RecognitionConfig,

    /// Query history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Language the session starts in
    #[serde(default)]
    pub default_language: LanguageMode,
}

impl Settings {
    /// Load settings from an optional TOML file plus environment
    /// variables (`CARELINK_SERVER__PORT=9000` style overrides).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            } else {
                tracing::warn!("Config file not found: {}", path.display());
            }
        }

        let config = builder
            .add_source(Environment::with_prefix("CARELINK").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extractor.endpoint.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extractor.endpoint".to_string(),
                message: "Endpoint must not be empty".to_string(),
            });
        }

        if self.extractor.model.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extractor.model".to_string(),
                message: "Model must not be empty".to_string(),
            });
        }

        if !(0.1..=4.0).contains(&self.narration.rate) {
            return Err(ConfigError::InvalidValue {
                field: "narration.rate".to_string(),
                message: format!("Rate {} outside 0.1..=4.0", self.narration.rate),
            });
        }

        if self.narration.watchdog_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "narration.watchdog_interval_secs".to_string(),
                message: "Watchdog interval must be non-zero".to_string(),
            });
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.capacity".to_string(),
                message: "History capacity must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum concurrent walkthrough sessions
    pub max_sessions: usize,
    /// Idle session expiry in seconds
    pub session_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_sessions: 100,
            session_timeout_secs: 3600,
        }
    }
}

/// Remote instruction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Bearer token for the service
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature (fixed low randomness)
    pub temperature: f32,
    /// Request timeout; a timeout is terminal, never retried
    pub timeout_secs: u64,
    /// Step count hinted to the service (prompt guidance only)
    pub max_steps: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.2,
            timeout_secs: 30,
            max_steps: 8,
        }
    }
}

/// Narration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Speaking rate (1.0 = normal)
    pub rate: f32,
    /// Watchdog tick interval for the stuck-synthesis guard
    pub watchdog_interval_secs: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            watchdog_interval_secs: 5,
        }
    }
}

/// Speech recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Keep listening after a final result
    pub continuous: bool,
    /// Deliver interim (non-final) results
    pub interim_results: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: true,
        }
    }
}

/// Query history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Most-recent entries kept
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 20 }
    }
}
