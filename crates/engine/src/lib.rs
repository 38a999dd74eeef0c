//! Walkthrough engine
//!
//! Owns the per-session progression through a step list: the pure
//! state machine, the session object wiring it to extraction and
//! narration, the bounded query history, and the session manager the
//! server hands sessions out from.

pub mod history;
pub mod manager;
pub mod session;
pub mod walkthrough;

pub use history::{HistoryEntry, QueryHistory};
pub use manager::SessionManager;
pub use session::WalkthroughSession;
pub use walkthrough::{
    Effect, Generation, Walkthrough, WalkthroughEvent, WalkthroughState,
    COMPLETION_MESSAGE, EXTRACT_FAILED_MESSAGE,
};

use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Session manager refused a session
    #[error("Session error: {0}")]
    Session(String),

    /// Speech subsystem failure reaching the session surface
    #[error("Speech error: {0}")]
    Speech(#[from] carelink_speech::SpeechError),
}
