//! Step and step-list types
//!
//! A walkthrough is an ordered, immutable list of short instructional
//! sentences. A new query always produces a wholly new list; lists are
//! never edited in place.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// One instructional sentence presented to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    text: String,
}

impl Step {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Per-step display status, derived from the active index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Active,
    Done,
}

/// Ordered, non-empty, immutable list of steps for one query
///
/// The extractor asks the remote service for 5-8 steps, but the bound
/// is prompt guidance only: any non-empty list is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepList {
    steps: Vec<Step>,
}

impl StepList {
    /// Build a list from raw strings, dropping blank entries.
    ///
    /// Fails with [`CoreError::EmptyStepList`] if nothing remains.
    pub fn new(raw: Vec<String>) -> Result<Self> {
        let steps: Vec<Step> = raw
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|text| Step { text })
            .collect();

        if steps.is_empty() {
            return Err(CoreError::EmptyStepList);
        }

        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a StepList cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Step> {
        self.steps.get(index).ok_or(CoreError::StepOutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Derive a step's status from the currently active index
    pub fn status_of(&self, index: usize, current: usize) -> StepStatus {
        if index < current {
            StepStatus::Done
        } else if index == current {
            StepStatus::Active
        } else {
            StepStatus::Pending
        }
    }
}
