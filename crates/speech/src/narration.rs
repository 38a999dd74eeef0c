//! Narration controller
//!
//! Owns spoken output. Exactly one utterance is ever active: a new
//! `speak` cancels the previous utterance and its watchdog before
//! starting the next one.
//!
//! The watchdog exists because the platform speech facility silently
//! pauses long utterances. It ticks on a fixed interval for the
//! lifetime of one utterance: once the facility reports not-speaking
//! it exits for good, otherwise it forces a resume. It is torn down
//! on utterance end, error, explicit stop, a deliberate pause, and
//! any superseding `speak`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use carelink_config::NarrationConfig;
use carelink_core::LanguageMode;

use crate::synth::{NarrationRequest, SpeechSynth, SynthEvent};
use crate::voice::select_voice;
use crate::Result;

/// Drives the speech-output facility for one session
pub struct NarrationController {
    synth: Arc<dyn SpeechSynth>,
    rate: f32,
    watchdog_interval: Duration,
    watchdog: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for NarrationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationController")
            .field("rate", &self.rate)
            .field("watchdog_interval", &self.watchdog_interval)
            .finish_non_exhaustive()
    }
}

impl NarrationController {
    pub fn new(synth: Arc<dyn SpeechSynth>, config: &NarrationConfig) -> Self {
        Self {
            synth,
            rate: config.rate,
            watchdog_interval: Duration::from_secs(config.watchdog_interval_secs),
            watchdog: Mutex::new(None),
        }
    }

    /// Cancel any in-flight utterance and speak `text` with the voice
    /// matched to `mode`.
    pub async fn speak(&self, text: &str, mode: LanguageMode) -> Result<()> {
        self.abort_watchdog();
        self.synth.cancel();

        let voice = select_voice(&self.synth.voices(), mode);
        tracing::debug!(?voice, locale = mode.locale(), "Narrating");

        let request = NarrationRequest {
            text: text.to_string(),
            language: mode,
            voice,
            rate: self.rate,
        };

        // Subscribe before speaking so a fast Finished is not missed.
        let events = self.synth.subscribe();
        self.synth.speak(request).await?;
        self.spawn_watchdog(events);

        Ok(())
    }

    /// Deliberate user pause; the watchdog must not fight it
    pub fn pause(&self) {
        self.abort_watchdog();
        self.synth.pause();
    }

    /// Resume a deliberately paused utterance and re-arm the watchdog
    pub fn resume(&self) {
        self.synth.resume();
        let events = self.synth.subscribe();
        self.spawn_watchdog(events);
    }

    /// Stop narration entirely
    pub fn stop(&self) {
        self.abort_watchdog();
        self.synth.cancel();
    }

    fn abort_watchdog(&self) {
        if let Some(handle) = self.watchdog.lock().take() {
            handle.abort();
        }
    }

    fn spawn_watchdog(&self, mut events: broadcast::Receiver<SynthEvent>) {
        let synth = Arc::clone(&self.synth);
        let period = self.watchdog_interval;

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !synth.is_speaking() {
                            break;
                        }
                        // Platform pauses long utterances; push it onward.
                        synth.resume();
                    }
                    event = events.recv() => match event {
                        Ok(SynthEvent::Finished) | Ok(SynthEvent::Error(_)) => break,
                        Ok(SynthEvent::Started) => {}
                        Err(_) => break,
                    },
                }
            }
        });

        if let Some(old) = self.watchdog.lock().replace(handle) {
            old.abort();
        }
    }
}

impl Drop for NarrationController {
    fn drop(&mut self) {
        self.abort_watchdog();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct MockState {
        speaking: bool,
        spoken: Vec<String>,
        resumes: usize,
        cancels: usize,
        pauses: usize,
    }

    struct MockSynth {
        state: Mutex<MockState>,
        events: broadcast::Sender<SynthEvent>,
    }

    impl MockSynth {
        fn new() -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                state: Mutex::new(MockState::default()),
                events,
            })
        }

        /// Utterance ran to completion
        fn finish(&self) {
            self.state.lock().speaking = false;
            let _ = self.events.send(SynthEvent::Finished);
        }

        fn resumes(&self) -> usize {
            self.state.lock().resumes
        }

        fn spoken(&self) -> Vec<String> {
            self.state.lock().spoken.clone()
        }
    }

    #[async_trait]
    impl SpeechSynth for MockSynth {
        async fn speak(&self, request: NarrationRequest) -> Result<()> {
            let mut state = self.state.lock();
            state.spoken.push(request.text);
            state.speaking = true;
            let _ = self.events.send(SynthEvent::Started);
            Ok(())
        }

        fn cancel(&self) {
            let mut state = self.state.lock();
            state.cancels += 1;
            state.speaking = false;
        }

        fn pause(&self) {
            self.state.lock().pauses += 1;
        }

        fn resume(&self) {
            self.state.lock().resumes += 1;
        }

        fn is_speaking(&self) -> bool {
            self.state.lock().speaking
        }

        fn voices(&self) -> Vec<crate::VoiceInfo> {
            vec![crate::VoiceInfo {
                name: "indian-english".to_string(),
                locale: "en-IN".to_string(),
                default: true,
            }]
        }

        fn subscribe(&self) -> broadcast::Receiver<SynthEvent> {
            self.events.subscribe()
        }
    }

    fn controller(synth: Arc<MockSynth>) -> NarrationController {
        NarrationController::new(synth, &NarrationConfig::default())
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn tick(secs: u64) {
        tokio::time::advance(Duration::from_secs(secs)).await;
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_speak_replaces_prior_utterance() {
        let synth = MockSynth::new();
        let narrator = controller(synth.clone());

        narrator.speak("Open WhatsApp.", LanguageMode::English).await.unwrap();
        narrator.speak("Tap Chat.", LanguageMode::English).await.unwrap();
        settle().await;

        assert_eq!(synth.spoken(), vec!["Open WhatsApp.", "Tap Chat."]);
        // Both speaks cancel whatever played before them.
        assert_eq!(synth.state.lock().cancels, 2);

        // Only the second utterance's watchdog is alive: one resume
        // per tick, not two.
        tick(5).await;
        assert_eq!(synth.resumes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_forces_resume_each_tick() {
        let synth = MockSynth::new();
        let narrator = controller(synth.clone());

        narrator.speak("A long narration.", LanguageMode::English).await.unwrap();
        settle().await;

        tick(5).await;
        assert_eq!(synth.resumes(), 1);
        tick(5).await;
        assert_eq!(synth.resumes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_never_fires_after_utterance_ends() {
        let synth = MockSynth::new();
        let narrator = controller(synth.clone());

        narrator.speak("Short.", LanguageMode::English).await.unwrap();
        settle().await;

        synth.finish();
        settle().await;

        // Even if the facility starts speaking again (a newer owner),
        // the finished utterance's watchdog stays dead.
        synth.state.lock().speaking = true;
        tick(15).await;
        assert_eq!(synth.resumes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliberate_pause_suspends_watchdog() {
        let synth = MockSynth::new();
        let narrator = controller(synth.clone());

        narrator.speak("Step one.", LanguageMode::English).await.unwrap();
        settle().await;

        narrator.pause();
        assert_eq!(synth.state.lock().pauses, 1);

        // Watchdog must not fight the user's pause.
        tick(15).await;
        assert_eq!(synth.resumes(), 0);

        narrator.resume();
        settle().await;
        assert_eq!(synth.resumes(), 1);

        // Watchdog re-armed after resume.
        tick(5).await;
        assert_eq!(synth.resumes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_tears_down_watchdog() {
        let synth = MockSynth::new();
        let narrator = controller(synth.clone());

        narrator.speak("Step one.", LanguageMode::English).await.unwrap();
        settle().await;

        narrator.stop();
        assert!(!synth.is_speaking());

        synth.state.lock().speaking = true;
        tick(15).await;
        assert_eq!(synth.resumes(), 0);
    }
}
