//! Configuration for the CareLink walkthrough engine
//!
//! Settings are layered: built-in defaults, an optional TOML file,
//! then `CARELINK_`-prefixed environment variables.

mod settings;

pub use settings::{
    ExtractorConfig, HistoryConfig, NarrationConfig, RecognitionConfig, ServerConfig,
    Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field failed validation
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Underlying loader error
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
