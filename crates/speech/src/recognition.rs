//! Speech recognition sessions
//!
//! One listening session at a time. The mic control has toggle
//! semantics: a start request while a session is live stops that
//! session instead of queuing another. The recognition locale is
//! pinned when the session starts; changing the language mode
//! mid-session only affects the next session.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use carelink_config::RecognitionConfig;
use carelink_core::{
    LanguageMode, RecognitionErrorKind, TranscriptAccumulator, TranscriptResult,
};

use crate::Result;

/// Notification from the speech-input facility
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// One result; the facility may offer several alternatives, the
    /// first is the best guess
    Result {
        alternatives: Vec<String>,
        is_final: bool,
    },
    /// Natural end of speech or an acknowledged stop
    End,
    /// Device or permission failure; ends the session, never retried
    Error(RecognitionErrorKind),
}

/// Where the mic control currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningStatus {
    Idle,
    Listening,
    Failed(RecognitionErrorKind),
}

/// Speech-input facility seam
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Begin capturing with a fixed locale for the session's duration
    async fn start(
        &self,
        locale: &str,
        config: &RecognitionConfig,
    ) -> Result<mpsc::Receiver<RecognitionEvent>>;

    /// Request the current session to stop; the backend acknowledges
    /// with [`RecognitionEvent::End`]
    fn stop(&self);
}

/// Owns the single listening session and its transcript
pub struct RecognitionControl {
    backend: Arc<dyn RecognitionBackend>,
    config: RecognitionConfig,
    status: Arc<Mutex<ListeningStatus>>,
    text_tx: watch::Sender<String>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RecognitionControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionControl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RecognitionControl {
    pub fn new(backend: Arc<dyn RecognitionBackend>, config: RecognitionConfig) -> Self {
        let (text_tx, _) = watch::channel(String::new());
        Self {
            backend,
            config,
            status: Arc::new(Mutex::new(ListeningStatus::Idle)),
            text_tx,
            pump: Mutex::new(None),
        }
    }

    /// Mic-button semantics: start listening, or stop the live session.
    ///
    /// Returns whether a session is now starting.
    pub async fn toggle(&self, mode: LanguageMode) -> Result<bool> {
        if self.is_listening() {
            tracing::debug!("Toggle while listening; stopping session");
            self.backend.stop();
            return Ok(false);
        }

        // Fresh buffer for the new session.
        self.text_tx.send_replace(String::new());

        let locale = mode.locale();
        let rx = self.backend.start(locale, &self.config).await?;
        tracing::debug!(locale, "Listening session started");

        *self.status.lock() = ListeningStatus::Listening;
        self.spawn_pump(rx);
        Ok(true)
    }

    pub fn is_listening(&self) -> bool {
        *self.status.lock() == ListeningStatus::Listening
    }

    pub fn status(&self) -> ListeningStatus {
        *self.status.lock()
    }

    /// Continuously updated best-guess query text
    pub fn transcript(&self) -> watch::Receiver<String> {
        self.text_tx.subscribe()
    }

    /// Current best-guess text, without holding a receiver
    pub fn current_text(&self) -> String {
        self.text_tx.borrow().clone()
    }

    fn spawn_pump(&self, mut rx: mpsc::Receiver<RecognitionEvent>) {
        let status = Arc::clone(&self.status);
        let text_tx = self.text_tx.clone();

        let handle = tokio::spawn(async move {
            let mut acc = TranscriptAccumulator::new();

            while let Some(event) = rx.recv().await {
                match event {
                    RecognitionEvent::Result {
                        alternatives,
                        is_final,
                    } => {
                        let Some(text) = alternatives.into_iter().next() else {
                            continue;
                        };
                        let result = if is_final {
                            TranscriptResult::final_result(text)
                        } else {
                            TranscriptResult::partial(text)
                        };
                        acc.push(&result);
                        text_tx.send_replace(acc.current_text());
                    }
                    RecognitionEvent::End => {
                        *status.lock() = ListeningStatus::Idle;
                        return;
                    }
                    RecognitionEvent::Error(kind) => {
                        tracing::warn!(?kind, "Listening session failed");
                        *status.lock() = ListeningStatus::Failed(kind);
                        return;
                    }
                }
            }

            // Channel dropped without a terminal event.
            let mut status = status.lock();
            if *status == ListeningStatus::Listening {
                *status = ListeningStatus::Idle;
            }
        });

        if let Some(old) = self.pump.lock().replace(handle) {
            old.abort();
        }
    }
}

/// In-process recognition backend
///
/// The real capture device lives on the client; this one hands the
/// pump a channel and lets the caller feed recognition events into
/// it, which keeps the listening path whole server-side and gives
/// tests a deterministic microphone.
pub struct LoopbackRecognition {
    tx: Mutex<Option<mpsc::Sender<RecognitionEvent>>>,
    started_locales: Mutex<Vec<String>>,
}

impl LoopbackRecognition {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
            started_locales: Mutex::new(Vec::new()),
        }
    }

    /// Feed one event into the live session, if any
    pub async fn feed(&self, event: RecognitionEvent) {
        let tx = self.tx.lock().clone();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }

    /// Locales of every session started so far
    pub fn started_locales(&self) -> Vec<String> {
        self.started_locales.lock().clone()
    }
}

impl Default for LoopbackRecognition {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionBackend for LoopbackRecognition {
    async fn start(
        &self,
        locale: &str,
        _config: &RecognitionConfig,
    ) -> Result<mpsc::Receiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::channel(16);
        *self.tx.lock() = Some(tx);
        self.started_locales.lock().push(locale.to_string());
        tracing::debug!(locale, "Loopback listening session");
        Ok(rx)
    }

    fn stop(&self) {
        if let Some(tx) = self.tx.lock().clone() {
            let _ = tx.try_send(RecognitionEvent::End);
        }
    }
}
