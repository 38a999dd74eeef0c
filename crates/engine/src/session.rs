//! Walkthrough session
//!
//! One user, one session, one logical timeline. The session wires the
//! pure state machine to the step extractor and the narration
//! controller, executes narration-bearing effects, and broadcasts
//! every effect for whatever surface is observing (HTTP handlers, a
//! future WebSocket push).
//!
//! Extraction runs as a spawned task carrying the generation token the
//! machine issued at submit time; there is no cancellation primitive
//! for an in-flight call, so a superseded call simply resolves into a
//! stale event the machine discards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use carelink_core::LanguageMode;
use carelink_extractor::StepExtractor;
use carelink_speech::{ListeningStatus, NarrationController, RecognitionControl};

use crate::EngineError;

use crate::history::{HistoryEntry, QueryHistory};
use crate::walkthrough::{
    Effect, Walkthrough, WalkthroughEvent, WalkthroughState, EXTRACT_FAILED_MESSAGE,
};

/// One user's walkthrough session
#[derive(Debug)]
pub struct WalkthroughSession {
    /// Session ID
    pub id: String,
    machine: Mutex<Walkthrough>,
    language: Mutex<LanguageMode>,
    history: Mutex<QueryHistory>,
    extractor: Arc<StepExtractor>,
    narrator: Arc<NarrationController>,
    recognition: Arc<RecognitionControl>,
    effects_tx: broadcast::Sender<Effect>,
    /// Last activity, for expiry
    last_activity: Mutex<Instant>,
}

impl WalkthroughSession {
    pub fn new(
        id: impl Into<String>,
        language: LanguageMode,
        history_capacity: usize,
        extractor: Arc<StepExtractor>,
        narrator: Arc<NarrationController>,
        recognition: Arc<RecognitionControl>,
    ) -> Self {
        let (effects_tx, _) = broadcast::channel(64);
        Self {
            id: id.into(),
            machine: Mutex::new(Walkthrough::new()),
            language: Mutex::new(language),
            history: Mutex::new(QueryHistory::new(history_capacity)),
            extractor,
            narrator,
            recognition,
            effects_tx,
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Observe every effect the session performs
    pub fn subscribe(&self) -> broadcast::Receiver<Effect> {
        self.effects_tx.subscribe()
    }

    pub fn state(&self) -> WalkthroughState {
        self.machine.lock().state()
    }

    pub fn progress(&self) -> Option<(usize, usize)> {
        self.machine.lock().progress()
    }

    /// Step texts of the current list, if one exists
    pub fn step_texts(&self) -> Option<Vec<String>> {
        self.machine
            .lock()
            .steps()
            .map(|list| list.iter().map(|s| s.text().to_string()).collect())
    }

    pub fn language(&self) -> LanguageMode {
        *self.language.lock()
    }

    /// Flip the language mode. The running walkthrough is untouched;
    /// only future extraction calls and future narration use the new
    /// mode.
    pub fn toggle_language(&self) -> LanguageMode {
        let mut language = self.language.lock();
        *language = language.toggled();
        tracing::debug!(mode = language.display_name(), "Language toggled");
        *language
    }

    /// Submit a query; spawns the extraction call on success
    pub async fn submit(self: &Arc<Self>, query: &str) {
        self.touch();
        let query = query.trim().to_string();

        let (effects, generation) = {
            let mut machine = self.machine.lock();
            let effects = machine.apply(WalkthroughEvent::Submit {
                query: query.clone(),
            });
            (effects, machine.generation())
        };
        self.run_effects(effects).await;

        if query.is_empty() {
            return;
        }

        let session = Arc::clone(self);
        let language = self.language();
        tokio::spawn(async move {
            match session.extractor.extract(&query, language).await {
                Ok(steps) => {
                    // Accept and record under one machine lock, so a
                    // superseding submit cannot slip between the
                    // history append and the state transition.
                    let effects = {
                        let mut machine = session.machine.lock();
                        if machine.generation() == generation {
                            session.history.lock().append(&query);
                        }
                        machine.apply(WalkthroughEvent::StepsReady { generation, steps })
                    };
                    session.run_effects(effects).await;
                }
                Err(error) => {
                    tracing::warn!(%error, "Step extraction failed");
                    session
                        .dispatch(WalkthroughEvent::ExtractFailed {
                            generation,
                            message: EXTRACT_FAILED_MESSAGE.to_string(),
                        })
                        .await;
                }
            }
        });
    }

    /// Mark the active step done
    pub async fn mark_done(&self) {
        self.touch();
        self.dispatch(WalkthroughEvent::MarkDone).await;
    }

    /// Narrate the active step again without advancing
    pub async fn repeat(&self) {
        self.touch();
        self.dispatch(WalkthroughEvent::Repeat).await;
    }

    /// Start over from the empty state
    pub async fn new_query(&self) {
        self.touch();
        self.dispatch(WalkthroughEvent::NewQuery).await;
    }

    /// User-facing narration controls
    pub fn pause_narration(&self) {
        self.narrator.pause();
    }

    pub fn resume_narration(&self) {
        self.narrator.resume();
    }

    pub fn stop_narration(&self) {
        self.narrator.stop();
    }

    /// Mic-button toggle: start listening in the session's current
    /// language, or stop the live listening session.
    ///
    /// Returns whether a session is now starting.
    pub async fn toggle_listening(&self) -> Result<bool, EngineError> {
        self.touch();
        let mode = self.language();
        Ok(self.recognition.toggle(mode).await?)
    }

    /// Where the mic control currently stands
    pub fn listening_status(&self) -> ListeningStatus {
        self.recognition.status()
    }

    /// Best-guess query text recognized so far, continuously updated
    /// while listening
    pub fn transcript(&self) -> String {
        self.recognition.current_text()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().list()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Check if the session has been idle past `timeout`
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.lock().elapsed() > timeout
    }

    async fn dispatch(&self, event: WalkthroughEvent) {
        let effects = self.machine.lock().apply(event);
        self.run_effects(effects).await;
    }

    async fn run_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match &effect {
                Effect::Narrate { text } => {
                    let mode = self.language();
                    if let Err(error) = self.narrator.speak(text, mode).await {
                        tracing::warn!(%error, "Narration failed");
                    }
                }
                Effect::CancelNarration => self.narrator.stop(),
                _ => {}
            }
            let _ = self.effects_tx.send(effect);
        }
    }
}
