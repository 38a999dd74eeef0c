//! Application state
//!
//! Shared across all handlers.

use std::sync::Arc;

use carelink_config::Settings;
use carelink_engine::SessionManager;
use carelink_extractor::HttpInstructionBackend;
use carelink_speech::{LoopbackRecognition, LoopbackSynth};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Create new application state over the HTTP instruction backend
    pub fn new(config: Settings) -> Self {
        let config = Arc::new(config);
        let backend = Arc::new(HttpInstructionBackend::new(&config.extractor));
        let synth = Arc::new(LoopbackSynth::new());
        let recognition = Arc::new(LoopbackRecognition::new());
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&config),
            backend,
            synth,
            recognition,
        ));

        Self { config, sessions }
    }
}
