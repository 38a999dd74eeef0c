//! Voice selection for the active language
//!
//! Preference order: exact locale match, then same base-language
//! prefix, then the platform default voice, then no override at all.

use carelink_core::LanguageMode;

use crate::synth::VoiceInfo;

/// Pick the best voice name for `mode`, or None for no override
pub fn select_voice(voices: &[VoiceInfo], mode: LanguageMode) -> Option<String> {
    if let Some(voice) = voices.iter().find(|v| v.locale == mode.locale()) {
        return Some(voice.name.clone());
    }

    if let Some(voice) = voices
        .iter()
        .find(|v| v.locale.starts_with(mode.base()))
    {
        return Some(voice.name.clone());
    }

    voices.iter().find(|v| v.default).map(|v| v.name.clone())
}
