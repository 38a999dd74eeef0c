//! Prompt building for the instruction service
//!
//! The system prompt pins the service to a bare JSON array of short
//! step strings in the session's language; everything else the
//! service wraps around it is stripped during parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use carelink_core::LanguageMode;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Build the two-message payload for one extraction call
pub fn build_messages(query: &str, language: LanguageMode, max_steps: usize) -> Vec<Message> {
    let system = format!(
        "You are CareLink Bharat, a patient guide for non-technical users. \
         Return ONLY a JSON array of step strings. No markdown.\n\
         - {max_steps} simple steps max.\n\
         - Language: {}.\n\
         Example: [\"Open WhatsApp.\", \"Tap Chat.\"]",
        language.display_name(),
    );

    vec![Message::system(system), Message::user(query)]
}
