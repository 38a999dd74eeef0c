//! Session management
//!
//! Hands out walkthrough sessions to the server layer, capacity
//! bounded, with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use carelink_config::Settings;
use carelink_extractor::{InstructionBackend, StepExtractor};
use carelink_speech::{
    NarrationController, RecognitionBackend, RecognitionControl, SpeechSynth,
};

use crate::session::WalkthroughSession;
use crate::EngineError;

/// Creates and tracks walkthrough sessions
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<WalkthroughSession>>>,
    settings: Arc<Settings>,
    backend: Arc<dyn InstructionBackend>,
    synth: Arc<dyn SpeechSynth>,
    recognition: Arc<dyn RecognitionBackend>,
    max_sessions: usize,
    session_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        settings: Arc<Settings>,
        backend: Arc<dyn InstructionBackend>,
        synth: Arc<dyn SpeechSynth>,
        recognition: Arc<dyn RecognitionBackend>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: settings.server.max_sessions,
            session_timeout: Duration::from_secs(settings.server.session_timeout_secs),
            settings,
            backend,
            synth,
            recognition,
        }
    }

    /// Create a new session
    pub fn create(&self) -> Result<Arc<WalkthroughSession>, EngineError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                return Err(EngineError::Session("Max sessions reached".to_string()));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let extractor = Arc::new(StepExtractor::new(
            Arc::clone(&self.backend),
            self.settings.extractor.max_steps,
        ));
        let narrator = Arc::new(NarrationController::new(
            Arc::clone(&self.synth),
            &self.settings.narration,
        ));
        let recognition = Arc::new(RecognitionControl::new(
            Arc::clone(&self.recognition),
            self.settings.recognition.clone(),
        ));

        let session = Arc::new(WalkthroughSession::new(
            &id,
            self.settings.default_language,
            self.settings.history.capacity,
            extractor,
            narrator,
            recognition,
        ));
        sessions.insert(id.clone(), Arc::clone(&session));

        tracing::info!("Created session: {}", id);
        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<WalkthroughSession>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session
    pub fn remove(&self, id: &str) {
        let mut sessions = self.sessions.write();
        if sessions.remove(id).is_some() {
            tracing::info!("Removed session: {}", id);
        }
    }

    /// Active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Drop sessions idle past the configured timeout
    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions);
    }

    fn cleanup_expired_internal(
        &self,
        sessions: &mut HashMap<String, Arc<WalkthroughSession>>,
    ) {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            sessions.remove(&id);
            tracing::info!("Expired session: {}", id);
        }
    }
}
