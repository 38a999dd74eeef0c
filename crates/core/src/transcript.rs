//! Transcript types for speech input
//!
//! Recognition delivers a stream of results, each tagged interim or
//! final. The accumulator merges them into one best-guess query
//! string that is continuously pushed to the query input.

use serde::{Deserialize, Serialize};

/// One recognition result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Transcribed text
    pub text: String,

    /// Is this a final result?
    pub is_final: bool,
}

impl TranscriptResult {
    /// Create a partial (non-final) transcript
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    /// Create a final transcript
    pub fn final_result(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Merges a listening session's results into one string
///
/// Final segments are appended in arrival order with no
/// de-duplication; each interim result supersedes the previous one.
/// Once any final segment exists, finals win over the interim.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    final_segments: Vec<String>,
    interim: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one recognition result
    pub fn push(&mut self, result: &TranscriptResult) {
        if result.is_final {
            self.final_segments.push(result.text.clone());
        } else {
            self.interim = result.text.clone();
        }
    }

    /// Current best-guess text
    pub fn current_text(&self) -> String {
        if self.final_segments.is_empty() {
            self.interim.clone()
        } else {
            self.final_segments.concat()
        }
    }

    /// Clear all state, ready for a new listening session
    pub fn reset(&mut self) {
        self.final_segments.clear();
        self.interim.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interim_only_before_any_final() {
        let mut acc = TranscriptAccumulator::new();
        acc.push(&TranscriptResult::partial("How to"));
        acc.push(&TranscriptResult::partial("How to pay"));
        assert_eq!(acc.current_text(), "How to pay");
    }

    #[test]
    fn test_finals_win_over_interim() {
        let mut acc = TranscriptAccumulator::new();
        acc.push(&TranscriptResult::final_result("Open "));
        acc.push(&TranscriptResult::final_result("WhatsApp."));
        acc.push(&TranscriptResult::partial("Tap Ch"));
        assert_eq!(acc.current_text(), "Open WhatsApp.");
    }

    #[test]
    fn test_finals_concatenated_in_order() {
        let mut acc = TranscriptAccumulator::new();
        acc.push(&TranscriptResult::final_result("pay "));
        acc.push(&TranscriptResult::final_result("electricity "));
        acc.push(&TranscriptResult::final_result("bill"));
        assert_eq!(acc.current_text(), "pay electricity bill");
    }

    #[test]
    fn test_reset() {
        let mut acc = TranscriptAccumulator::new();
        acc.push(&TranscriptResult::final_result("Open WhatsApp."));
        acc.reset();
        assert_eq!(acc.current_text(), "");
        acc.push(&TranscriptResult::partial("new"));
        assert_eq!(acc.current_text(), "new");
    }
}
