//! Core types for the CareLink walkthrough engine
//!
//! This crate provides foundational types used across all other crates:
//! - Step and step-list types
//! - Language mode (bilingual English/Hindi)
//! - Transcript accumulation for speech input
//! - Error types

pub mod error;
pub mod language;
pub mod step;
pub mod transcript;

pub use error::{CoreError, RecognitionErrorKind, Result};
pub use language::LanguageMode;
pub use step::{Step, StepList, StepStatus};
pub use transcript::{TranscriptAccumulator, TranscriptResult};
