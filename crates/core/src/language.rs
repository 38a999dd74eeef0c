//! Bilingual language mode
//!
//! A single process-wide setting consulted by recognition (locale),
//! narration (voice locale) and the step extractor (response
//! language). It is only ever changed by an explicit user toggle.

use serde::{Deserialize, Serialize};

/// The two supported interaction languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    #[default]
    English,
    Hindi,
}

impl LanguageMode {
    /// BCP-47 locale tag used for recognition and narration
    pub fn locale(&self) -> &'static str {
        match self {
            LanguageMode::English => "en-IN",
            LanguageMode::Hindi => "hi-IN",
        }
    }

    /// Base language code, used for prefix voice matching
    pub fn base(&self) -> &'static str {
        match self {
            LanguageMode::English => "en",
            LanguageMode::Hindi => "hi",
        }
    }

    /// Display name for prompts and logs
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageMode::English => "English",
            LanguageMode::Hindi => "Hindi",
        }
    }

    /// The other mode
    pub fn toggled(&self) -> Self {
        match self {
            LanguageMode::English => LanguageMode::Hindi,
            LanguageMode::Hindi => LanguageMode::English,
        }
    }
}
