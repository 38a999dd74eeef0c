//! Speech-output backend seam

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use carelink_core::LanguageMode;

use crate::Result;

/// One spoken utterance; transient, never persisted
#[derive(Debug, Clone)]
pub struct NarrationRequest {
    /// Text to speak
    pub text: String,
    /// Language the voice should match
    pub language: LanguageMode,
    /// Voice override, if one matched
    pub voice: Option<String>,
    /// Speaking rate (1.0 = normal)
    pub rate: f32,
}

/// A voice the output facility offers
#[derive(Debug, Clone)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP-47 locale tag, e.g. "en-IN"
    pub locale: String,
    /// Platform default voice
    pub default: bool,
}

/// Synthesis lifecycle notifications
#[derive(Debug, Clone)]
pub enum SynthEvent {
    Started,
    Finished,
    Error(String),
}

/// Speech-output facility
///
/// `is_speaking` must be synchronously queryable: the narration
/// watchdog polls it on every tick.
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    /// Start speaking; returns once the utterance is enqueued.
    /// Completion arrives as [`SynthEvent::Finished`].
    async fn speak(&self, request: NarrationRequest) -> Result<()>;

    /// Cancel any playing or queued utterance
    fn cancel(&self);

    /// Suspend the current utterance
    fn pause(&self);

    /// Resume a suspended utterance
    fn resume(&self);

    /// Is an utterance playing or suspended right now?
    fn is_speaking(&self) -> bool;

    /// Voices this facility offers
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Subscribe to lifecycle notifications
    fn subscribe(&self) -> broadcast::Receiver<SynthEvent>;
}

/// Synth stand-in for headless deployments
///
/// The real speech facility lives on the client; this one records the
/// last request, reports instant completion, and keeps the engine's
/// narration path whole.
pub struct LoopbackSynth {
    last_request: Mutex<Option<NarrationRequest>>,
    voices: Vec<VoiceInfo>,
    events: broadcast::Sender<SynthEvent>,
}

impl LoopbackSynth {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            last_request: Mutex::new(None),
            voices: Vec::new(),
            events,
        }
    }

    /// The most recent utterance, if any
    pub fn last_request(&self) -> Option<NarrationRequest> {
        self.last_request.lock().clone()
    }
}

impl Default for LoopbackSynth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynth for LoopbackSynth {
    async fn speak(&self, request: NarrationRequest) -> Result<()> {
        tracing::debug!(text = %request.text, "Loopback narration");
        *self.last_request.lock() = Some(request);
        let _ = self.events.send(SynthEvent::Started);
        let _ = self.events.send(SynthEvent::Finished);
        Ok(())
    }

    fn cancel(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SynthEvent> {
        self.events.subscribe()
    }
}
