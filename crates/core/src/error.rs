//! Core error types

use thiserror::Error;

/// Errors from core type construction and indexing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An empty query was submitted; the message doubles as the
    /// inline status line
    #[error("Please enter a query.")]
    EmptyQuery,

    /// The extracted step list contained no steps
    #[error("Step list is empty")]
    EmptyStepList,

    /// A step index was outside the list bounds
    #[error("Step index {index} out of range (len {len})")]
    StepOutOfRange { index: usize, len: usize },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Categorized speech-recognition failure
///
/// Mirrors the error categories the capture device reports. A
/// recognition error ends the listening session; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// No speech was detected before the device gave up
    NoSpeech,
    /// No usable microphone was found
    NoMicrophone,
    /// Microphone permission was denied
    PermissionDenied,
    /// Network unavailable for the recognition service
    Network,
    /// The user cancelled the listening session
    Aborted,
    /// Anything else
    Other,
}

impl RecognitionErrorKind {
    /// Human-readable status line for the UI
    pub fn status_message(&self) -> &'static str {
        match self {
            RecognitionErrorKind::NoSpeech => "No speech detected. Try again.",
            RecognitionErrorKind::NoMicrophone => "No microphone found.",
            RecognitionErrorKind::PermissionDenied => "Microphone permission denied.",
            RecognitionErrorKind::Network => "Network unavailable for voice input.",
            RecognitionErrorKind::Aborted => "Listening cancelled.",
            RecognitionErrorKind::Other => "Microphone error. Try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::StepOutOfRange { index: 7, len: 5 };
        assert_eq!(err.to_string(), "Step index 7 out of range (len 5)");
        assert_eq!(CoreError::EmptyQuery.to_string(), "Please enter a query.");
    }

    #[test]
    fn test_recognition_messages_distinct() {
        let kinds = [
            RecognitionErrorKind::NoSpeech,
            RecognitionErrorKind::NoMicrophone,
            RecognitionErrorKind::PermissionDenied,
            RecognitionErrorKind::Network,
            RecognitionErrorKind::Aborted,
            RecognitionErrorKind::Other,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in kinds.iter().skip(i + 1) {
                assert_ne!(a.status_message(), b.status_message());
            }
        }
    }
}
