//! Speech input and output for the walkthrough engine
//!
//! Two concerns live here, each behind a backend trait so the engine
//! and tests never touch a real speech facility:
//! - **Narration**: spoken output with a watchdog that defends long
//!   utterances against the platform silently pausing them.
//! - **Recognition**: one listening session at a time, merging
//!   interim/final results into a single best-guess query string.

pub mod narration;
pub mod recognition;
pub mod synth;
pub mod voice;

pub use narration::NarrationController;
pub use recognition::{
    ListeningStatus, LoopbackRecognition, RecognitionBackend, RecognitionControl,
    RecognitionEvent,
};
pub use synth::{LoopbackSynth, NarrationRequest, SpeechSynth, SynthEvent, VoiceInfo};
pub use voice::select_voice;

use thiserror::Error;

/// Speech subsystem errors
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Speech-output facility failure
    #[error("Synthesis error: {0}")]
    Synth(String),

    /// Speech-input facility failure
    #[error("Recognition error: {0}")]
    Recognition(String),
}

/// Result type for speech operations
pub type Result<T> = std::result::Result<T, SpeechError>;
