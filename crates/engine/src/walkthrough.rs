//! Walkthrough state machine
//!
//! `Idle -> Loading -> Presenting(i) -> Completed`, driven by explicit
//! events. Each transition is a pure function of (state, event) that
//! returns the side effects the caller must perform, which keeps every
//! transition unit-testable without a speech backend or network.
//!
//! Asynchronous extraction results carry the generation token the
//! machine issued when the query was submitted; a result tagged with a
//! superseded generation is silently discarded.

use serde::Serialize;

use carelink_core::{CoreError, StepList};

/// Fixed completion narration; the original speaks this in English
/// regardless of the language mode.
pub const COMPLETION_MESSAGE: &str = "Congratulations! You have completed all steps.";

/// Status line for a failed extraction
pub const EXTRACT_FAILED_MESSAGE: &str = "Request failed. Try again.";

/// Marker distinguishing one walkthrough attempt from a superseding one
pub type Generation = u64;

/// Machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkthroughState {
    /// Pre-submission empty state
    Idle,
    /// Awaiting the step extractor
    Loading,
    /// Walking the user through step `index`
    Presenting { index: usize },
    /// All steps marked done
    Completed,
}

/// Events the machine consumes
#[derive(Debug, Clone)]
pub enum WalkthroughEvent {
    /// User submitted a query (typed or spoken)
    Submit { query: String },
    /// Extraction succeeded for the tagged attempt
    StepsReady {
        generation: Generation,
        steps: StepList,
    },
    /// Extraction failed terminally for the tagged attempt
    ExtractFailed {
        generation: Generation,
        message: String,
    },
    /// User marked the active step done
    MarkDone,
    /// User asked to hear the active step again
    Repeat,
    /// User started over
    NewQuery,
}

/// Side effects a transition demands of the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Drop any prior step list and terminal UI
    ClearSession,
    ShowLoading,
    ShowError { message: String },
    /// Render `total` steps, all pending
    RenderSteps { total: usize },
    SetActive { index: usize },
    /// Replace the step's ordinal marker with a completion mark
    MarkStepDone { index: usize },
    UpdateProgress { done: usize, total: usize },
    ScrollToStep { index: usize },
    Narrate { text: String },
    CancelNarration,
    ShowCelebration,
}

/// The per-session progression machine
#[derive(Debug)]
pub struct Walkthrough {
    state: WalkthroughState,
    steps: Option<StepList>,
    generation: Generation,
}

impl Walkthrough {
    pub fn new() -> Self {
        Self {
            state: WalkthroughState::Idle,
            steps: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> WalkthroughState {
        self.state
    }

    pub fn steps(&self) -> Option<&StepList> {
        self.steps.as_ref()
    }

    /// Token of the current walkthrough attempt
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Steps done and total, while a list exists
    pub fn progress(&self) -> Option<(usize, usize)> {
        let total = self.steps.as_ref()?.len();
        match self.state {
            WalkthroughState::Presenting { index } => Some((index, total)),
            WalkthroughState::Completed => Some((total, total)),
            _ => None,
        }
    }

    /// Apply one event; returns the side effects to perform
    pub fn apply(&mut self, event: WalkthroughEvent) -> Vec<Effect> {
        match event {
            WalkthroughEvent::Submit { query } => self.on_submit(&query),
            WalkthroughEvent::StepsReady { generation, steps } => {
                self.on_steps_ready(generation, steps)
            }
            WalkthroughEvent::ExtractFailed {
                generation,
                message,
            } => self.on_extract_failed(generation, message),
            WalkthroughEvent::MarkDone => self.on_mark_done(),
            WalkthroughEvent::Repeat => self.on_repeat(),
            WalkthroughEvent::NewQuery => self.on_new_query(),
        }
    }

    fn on_submit(&mut self, query: &str) -> Vec<Effect> {
        if query.trim().is_empty() {
            // Recovered locally; no state change.
            return vec![Effect::ShowError {
                message: CoreError::EmptyQuery.to_string(),
            }];
        }

        self.generation += 1;
        self.steps = None;
        self.state = WalkthroughState::Loading;
        tracing::debug!(generation = self.generation, "Query submitted");

        vec![
            Effect::CancelNarration,
            Effect::ClearSession,
            Effect::ShowLoading,
        ]
    }

    fn on_steps_ready(&mut self, generation: Generation, steps: StepList) -> Vec<Effect> {
        if generation != self.generation || self.state != WalkthroughState::Loading {
            tracing::debug!(generation, current = self.generation, "Stale steps ignored");
            return Vec::new();
        }

        let total = steps.len();
        let first = steps.get(0).map(|s| s.text().to_string()).unwrap_or_default();
        self.steps = Some(steps);
        self.state = WalkthroughState::Presenting { index: 0 };

        vec![
            Effect::RenderSteps { total },
            Effect::SetActive { index: 0 },
            Effect::UpdateProgress { done: 0, total },
            Effect::ScrollToStep { index: 0 },
            Effect::Narrate { text: first },
        ]
    }

    fn on_extract_failed(&mut self, generation: Generation, message: String) -> Vec<Effect> {
        if generation != self.generation || self.state != WalkthroughState::Loading {
            tracing::debug!(generation, current = self.generation, "Stale failure ignored");
            return Vec::new();
        }

        self.state = WalkthroughState::Idle;
        vec![Effect::ShowError { message }]
    }

    fn on_mark_done(&mut self) -> Vec<Effect> {
        let WalkthroughState::Presenting { index } = self.state else {
            return Vec::new();
        };
        let Some(steps) = self.steps.as_ref() else {
            return Vec::new();
        };

        let total = steps.len();
        let done = index + 1;

        if done < total {
            let next_text = steps
                .get(done)
                .map(|s| s.text().to_string())
                .unwrap_or_default();
            self.state = WalkthroughState::Presenting { index: done };

            vec![
                Effect::MarkStepDone { index },
                Effect::SetActive { index: done },
                Effect::UpdateProgress { done, total },
                Effect::ScrollToStep { index: done },
                Effect::Narrate { text: next_text },
            ]
        } else {
            self.state = WalkthroughState::Completed;
            tracing::info!(total, "Walkthrough completed");

            vec![
                Effect::MarkStepDone { index },
                Effect::UpdateProgress { done, total },
                Effect::ShowCelebration,
                Effect::Narrate {
                    text: COMPLETION_MESSAGE.to_string(),
                },
            ]
        }
    }

    fn on_repeat(&mut self) -> Vec<Effect> {
        let WalkthroughState::Presenting { index } = self.state else {
            return Vec::new();
        };
        let Some(text) = self
            .steps
            .as_ref()
            .and_then(|s| s.get(index).ok())
            .map(|s| s.text().to_string())
        else {
            return Vec::new();
        };

        vec![Effect::Narrate { text }]
    }

    fn on_new_query(&mut self) -> Vec<Effect> {
        self.state = WalkthroughState::Idle;
        self.steps = None;
        vec![Effect::CancelNarration, Effect::ClearSession]
    }
}

impl Default for Walkthrough {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(texts: &[&str]) -> StepList {
        StepList::new(texts.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn submitted(machine: &mut Walkthrough, query: &str) -> Generation {
        machine.apply(WalkthroughEvent::Submit {
            query: query.to_string(),
        });
        machine.generation()
    }

    #[test]
    fn test_empty_query_is_local_error() {
        let mut machine = Walkthrough::new();
        let effects = machine.apply(WalkthroughEvent::Submit {
            query: "   ".to_string(),
        });

        assert_eq!(machine.state(), WalkthroughState::Idle);
        assert_eq!(
            effects,
            vec![Effect::ShowError {
                message: CoreError::EmptyQuery.to_string()
            }]
        );
    }

    #[test]
    fn test_submit_enters_loading() {
        let mut machine = Walkthrough::new();
        let effects = machine.apply(WalkthroughEvent::Submit {
            query: "pay electricity bill".to_string(),
        });

        assert_eq!(machine.state(), WalkthroughState::Loading);
        assert_eq!(
            effects,
            vec![
                Effect::CancelNarration,
                Effect::ClearSession,
                Effect::ShowLoading
            ]
        );
    }

    #[test]
    fn test_steps_ready_presents_and_narrates_first() {
        let mut machine = Walkthrough::new();
        let generation = submitted(&mut machine, "how to message someone");

        let effects = machine.apply(WalkthroughEvent::StepsReady {
            generation,
            steps: steps(&["Open WhatsApp.", "Tap Chat."]),
        });

        assert_eq!(machine.state(), WalkthroughState::Presenting { index: 0 });
        assert_eq!(machine.progress(), Some((0, 2)));
        assert!(effects.contains(&Effect::Narrate {
            text: "Open WhatsApp.".to_string()
        }));
        assert!(effects.contains(&Effect::UpdateProgress { done: 0, total: 2 }));
    }

    #[test]
    fn test_ordered_mark_done_reaches_completed() {
        let mut machine = Walkthrough::new();
        let generation = submitted(&mut machine, "q");
        let list = steps(&["a", "b", "c", "d", "e", "f"]);
        machine.apply(WalkthroughEvent::StepsReady {
            generation,
            steps: list,
        });

        let mut celebrations = 0;
        for expected_done in 1..=6usize {
            let effects = machine.apply(WalkthroughEvent::MarkDone);
            assert!(effects.contains(&Effect::UpdateProgress {
                done: expected_done,
                total: 6
            }));
            celebrations += effects
                .iter()
                .filter(|e| **e == Effect::ShowCelebration)
                .count();
        }

        assert_eq!(machine.state(), WalkthroughState::Completed);
        assert_eq!(machine.progress(), Some((6, 6)));
        assert_eq!(celebrations, 1);

        // Completed is terminal for MarkDone.
        assert!(machine.apply(WalkthroughEvent::MarkDone).is_empty());
    }

    #[test]
    fn test_completion_narrated_once_with_fixed_message() {
        let mut machine = Walkthrough::new();
        let generation = submitted(&mut machine, "q");
        machine.apply(WalkthroughEvent::StepsReady {
            generation,
            steps: steps(&["only step"]),
        });

        let effects = machine.apply(WalkthroughEvent::MarkDone);
        assert!(effects.contains(&Effect::Narrate {
            text: COMPLETION_MESSAGE.to_string()
        }));
        assert!(effects.contains(&Effect::ShowCelebration));
    }

    #[test]
    fn test_repeat_does_not_advance() {
        let mut machine = Walkthrough::new();
        let generation = submitted(&mut machine, "q");
        machine.apply(WalkthroughEvent::StepsReady {
            generation,
            steps: steps(&["a", "b"]),
        });

        let effects = machine.apply(WalkthroughEvent::Repeat);
        assert_eq!(
            effects,
            vec![Effect::Narrate {
                text: "a".to_string()
            }]
        );
        assert_eq!(machine.state(), WalkthroughState::Presenting { index: 0 });
    }

    #[test]
    fn test_extract_failure_returns_to_idle() {
        let mut machine = Walkthrough::new();
        let generation = submitted(&mut machine, "q");

        let effects = machine.apply(WalkthroughEvent::ExtractFailed {
            generation,
            message: EXTRACT_FAILED_MESSAGE.to_string(),
        });

        assert_eq!(machine.state(), WalkthroughState::Idle);
        assert_eq!(
            effects,
            vec![Effect::ShowError {
                message: EXTRACT_FAILED_MESSAGE.to_string()
            }]
        );
    }

    #[test]
    fn test_stale_steps_silently_discarded() {
        let mut machine = Walkthrough::new();
        let first = submitted(&mut machine, "q1");
        let second = submitted(&mut machine, "q2");
        assert_ne!(first, second);

        // Q1's late result must not touch the session Q2 now drives.
        let effects = machine.apply(WalkthroughEvent::StepsReady {
            generation: first,
            steps: steps(&["stale"]),
        });
        assert!(effects.is_empty());
        assert_eq!(machine.state(), WalkthroughState::Loading);

        let effects = machine.apply(WalkthroughEvent::StepsReady {
            generation: second,
            steps: steps(&["fresh"]),
        });
        assert_eq!(machine.state(), WalkthroughState::Presenting { index: 0 });
        assert!(effects.contains(&Effect::Narrate {
            text: "fresh".to_string()
        }));
    }

    #[test]
    fn test_stale_failure_silently_discarded() {
        let mut machine = Walkthrough::new();
        let first = submitted(&mut machine, "q1");
        submitted(&mut machine, "q2");

        let effects = machine.apply(WalkthroughEvent::ExtractFailed {
            generation: first,
            message: "late".to_string(),
        });
        assert!(effects.is_empty());
        assert_eq!(machine.state(), WalkthroughState::Loading);
    }

    #[test]
    fn test_new_query_resets_from_any_state() {
        let mut machine = Walkthrough::new();
        let generation = submitted(&mut machine, "q");
        machine.apply(WalkthroughEvent::StepsReady {
            generation,
            steps: steps(&["a"]),
        });
        machine.apply(WalkthroughEvent::MarkDone);
        assert_eq!(machine.state(), WalkthroughState::Completed);

        let effects = machine.apply(WalkthroughEvent::NewQuery);
        assert_eq!(machine.state(), WalkthroughState::Idle);
        assert!(machine.steps().is_none());
        assert!(effects.contains(&Effect::CancelNarration));
    }

    #[test]
    fn test_mark_done_outside_presenting_is_noop() {
        let mut machine = Walkthrough::new();
        assert!(machine.apply(WalkthroughEvent::MarkDone).is_empty());
        assert!(machine.apply(WalkthroughEvent::Repeat).is_empty());

        submitted(&mut machine, "q");
        assert!(machine.apply(WalkthroughEvent::MarkDone).is_empty());
        assert_eq!(machine.state(), WalkthroughState::Loading);
    }
}
