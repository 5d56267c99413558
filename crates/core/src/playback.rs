use crate::platform::{
    SpeechSynthesizer, SynthesisErrorKind, SynthesisEvent, Utterance, UtteranceId, Voice,
};

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;
pub const DEFAULT_RATE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
}

/// Reads responses aloud through a speech synthesizer.
///
/// At most one utterance is ever active: every `speak` cancels the previous one
/// first, and callbacks that belong to a superseded utterance are ignored.
pub struct PlaybackController {
    synthesizer: Box<dyn SpeechSynthesizer>,
    state: PlaybackState,
    catalog: Vec<Voice>,
    platform_has_voices: bool,
    selected_voice: Option<String>,
    rate: f32,
    active: Option<UtteranceId>,
    next_id: u64,
    last_error: Option<SynthesisErrorKind>,
}

impl PlaybackController {
    pub fn new(mut synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        synthesizer.watch_voices();
        let mut controller = Self {
            synthesizer,
            state: PlaybackState::Idle,
            catalog: Vec::new(),
            platform_has_voices: false,
            selected_voice: None,
            rate: DEFAULT_RATE,
            active: None,
            next_id: 1,
            last_error: None,
        };
        controller.refresh_voices();
        controller
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_speaking(&self) -> bool {
        self.state == PlaybackState::Speaking
    }

    /// The utterance handed to the synthesizer and not yet finished or canceled.
    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active
    }

    /// English voices only.
    pub fn voices(&self) -> &[Voice] {
        &self.catalog
    }

    pub fn selected_voice(&self) -> Option<&str> {
        self.selected_voice.as_deref()
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn last_error(&self) -> Option<SynthesisErrorKind> {
        self.last_error
    }

    /// Selects a voice from the catalog. Unknown ids are ignored.
    pub fn select_voice(&mut self, voice_id: &str) -> bool {
        if self.catalog.iter().any(|v| v.id == voice_id) {
            self.selected_voice = Some(voice_id.to_string());
            true
        } else {
            tracing::debug!("Ignoring unknown voice '{}'", voice_id);
            false
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(MIN_RATE, MAX_RATE);
    }

    /// Speaks `text`, replacing anything currently playing.
    ///
    /// Returns the id of the new utterance, or `None` when there was nothing to say
    /// or no voice to say it with.
    pub fn speak(&mut self, text: &str, voice_id: Option<&str>, rate: f32) -> Option<UtteranceId> {
        if text.trim().is_empty() {
            tracing::debug!("Nothing to speak");
            return None;
        }

        let voice = voice_id.and_then(|id| self.catalog.iter().find(|v| v.id == id).cloned());
        if voice.is_none() && !self.platform_has_voices {
            tracing::debug!("No voice available, skipping playback");
            return None;
        }

        self.cancel_active();

        let id = UtteranceId(self.next_id);
        self.next_id += 1;
        let utterance = Utterance {
            id,
            text: text.to_string(),
            voice,
            rate,
        };
        tracing::debug!(
            "Speaking utterance {} with voice {:?} at rate {:.1}",
            id,
            utterance.voice.as_ref().map(|v| v.name.as_str()),
            rate
        );

        match self.synthesizer.speak(utterance) {
            Ok(()) => {
                self.active = Some(id);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Speech synthesizer rejected utterance {}: {}", id, e);
                self.last_error = Some(SynthesisErrorKind::SynthesisFailed);
                self.state = PlaybackState::Idle;
                None
            }
        }
    }

    /// Stops playback immediately. Does nothing when idle.
    pub fn stop(&mut self) {
        if self.active.is_none() && self.state == PlaybackState::Idle {
            return;
        }
        self.cancel_active();
        tracing::info!("Playback stopped");
    }

    /// The user-facing play/stop button, using the selected voice and rate.
    pub fn toggle(&mut self, text: &str) {
        if self.active.is_some() || self.state == PlaybackState::Speaking {
            self.stop();
        } else {
            let voice = self.selected_voice.clone();
            self.speak(text, voice.as_deref(), self.rate);
        }
    }

    /// Applies a synthesizer callback and returns the resulting state.
    pub fn on_event(&mut self, event: SynthesisEvent) -> PlaybackState {
        match event {
            SynthesisEvent::VoicesChanged => self.refresh_voices(),
            SynthesisEvent::Started(id) if self.active == Some(id) => {
                self.state = PlaybackState::Speaking;
                tracing::info!("Speaking...");
            }
            SynthesisEvent::Ended(id) if self.active == Some(id) => {
                self.active = None;
                self.state = PlaybackState::Idle;
                tracing::info!("Finished speaking");
            }
            SynthesisEvent::Error(id, kind) if self.active == Some(id) => {
                self.active = None;
                self.state = PlaybackState::Idle;
                self.last_error = Some(kind);
                tracing::warn!("Speech synthesis error on utterance {}: {}", id, kind);
            }
            SynthesisEvent::Started(id) | SynthesisEvent::Ended(id) | SynthesisEvent::Error(id, _) => {
                tracing::debug!("Ignoring callback for superseded utterance {}", id);
            }
        }
        self.state
    }

    fn refresh_voices(&mut self) {
        let voices = self.synthesizer.voices();
        self.platform_has_voices = !voices.is_empty();
        self.catalog = voices.into_iter().filter(Voice::is_english).collect();
        if self.selected_voice.is_none() {
            self.selected_voice = self.catalog.first().map(|v| v.id.clone());
        }
        tracing::debug!(
            "Voice catalog refreshed: {} English voices, selected {:?}",
            self.catalog.len(),
            self.selected_voice
        );
    }

    fn cancel_active(&mut self) {
        if self.active.is_some() || self.state == PlaybackState::Speaking {
            self.synthesizer.cancel();
        }
        self.active = None;
        self.state = PlaybackState::Idle;
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.cancel_active();
        self.synthesizer.unwatch_voices();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MockSpeechSynthesizer, PlatformError};
    use std::sync::{Arc, Mutex};

    fn voices() -> Vec<Voice> {
        vec![
            Voice::new("fr-amelie", "Amelie", "fr-FR"),
            Voice::new("en-samantha", "Samantha", "en-US"),
            Voice::new("en-daniel", "Daniel", "en-GB"),
        ]
    }

    fn mock_with(voices: Vec<Voice>) -> MockSpeechSynthesizer {
        let mut synth = MockSpeechSynthesizer::new();
        synth.expect_watch_voices().return_const(());
        synth.expect_unwatch_voices().return_const(());
        synth.expect_voices().returning(move || voices.clone());
        synth
    }

    #[test]
    fn test_catalog_is_filtered_and_first_voice_selected() {
        let mut synth = mock_with(voices());
        synth.expect_cancel().return_const(());
        let controller = PlaybackController::new(Box::new(synth));

        let ids: Vec<&str> = controller.voices().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["en-samantha", "en-daniel"]);
        assert_eq!(controller.selected_voice(), Some("en-samantha"));
    }

    #[test]
    fn test_catalog_populates_later() {
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let source = loaded.clone();

        let mut synth = MockSpeechSynthesizer::new();
        synth.expect_watch_voices().return_const(());
        synth.expect_unwatch_voices().return_const(());
        synth.expect_cancel().return_const(());
        synth
            .expect_voices()
            .returning(move || source.lock().unwrap().clone());
        let mut controller = PlaybackController::new(Box::new(synth));
        assert!(controller.voices().is_empty());
        assert_eq!(controller.selected_voice(), None);

        *loaded.lock().unwrap() = voices();
        controller.on_event(SynthesisEvent::VoicesChanged);
        assert_eq!(controller.voices().len(), 2);
        assert_eq!(controller.selected_voice(), Some("en-samantha"));

        // A later refresh keeps the user's choice.
        controller.select_voice("en-daniel");
        controller.on_event(SynthesisEvent::VoicesChanged);
        assert_eq!(controller.selected_voice(), Some("en-daniel"));
    }

    #[test]
    fn test_speak_transitions_on_acknowledgement() {
        let mut synth = mock_with(voices());
        synth.expect_speak().returning(|_| Ok(())).once();
        synth.expect_cancel().return_const(());
        let mut controller = PlaybackController::new(Box::new(synth));

        let id = controller.speak("Hello", Some("en-daniel"), 1.0).unwrap();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.on_event(SynthesisEvent::Started(id)), PlaybackState::Speaking);
        assert_eq!(controller.on_event(SynthesisEvent::Ended(id)), PlaybackState::Idle);
        assert_eq!(controller.active_utterance(), None);
    }

    #[test]
    fn test_second_speak_cancels_first() {
        // Records the order of synthesizer calls so we can check that the
        // cancel happens strictly before the second utterance is queued.
        let calls = Arc::new(Mutex::new(Vec::<String>::new()));
        let speak_log = calls.clone();
        let cancel_log = calls.clone();

        let mut synth = mock_with(voices());
        synth.expect_speak().returning(move |u| {
            speak_log.lock().unwrap().push(format!("speak {}", u.id));
            Ok(())
        });
        synth
            .expect_cancel()
            .returning(move || cancel_log.lock().unwrap().push("cancel".into()));
        let mut controller = PlaybackController::new(Box::new(synth));

        let first = controller.speak("one", None, 1.0).unwrap();
        controller.on_event(SynthesisEvent::Started(first));
        let second = controller.speak("two", None, 1.0).unwrap();

        assert_ne!(first, second);
        assert_eq!(controller.active_utterance(), Some(second));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["speak #1".to_string(), "cancel".to_string(), "speak #2".to_string()]
        );

        // The canceled utterance's late callbacks must not disturb the new one.
        controller.on_event(SynthesisEvent::Started(second));
        assert_eq!(
            controller.on_event(SynthesisEvent::Error(first, SynthesisErrorKind::Interrupted)),
            PlaybackState::Speaking
        );
        assert_eq!(controller.on_event(SynthesisEvent::Ended(first)), PlaybackState::Speaking);
        assert_eq!(controller.last_error(), None);
    }

    #[test]
    fn test_stop_from_idle_is_a_noop() {
        let mut synth = mock_with(voices());
        synth.expect_cancel().never();
        let mut controller = PlaybackController::new(Box::new(synth));

        controller.stop();
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_stop_is_immediate() {
        let mut synth = mock_with(voices());
        synth.expect_speak().returning(|_| Ok(()));
        synth.expect_cancel().return_const(()).times(1);
        let mut controller = PlaybackController::new(Box::new(synth));

        let id = controller.speak("long answer", None, 1.0).unwrap();
        controller.on_event(SynthesisEvent::Started(id));
        controller.stop();
        assert_eq!(controller.state(), PlaybackState::Idle);

        // The platform's own end callback arrives afterwards and changes nothing.
        assert_eq!(controller.on_event(SynthesisEvent::Ended(id)), PlaybackState::Idle);
    }

    #[test]
    fn test_unknown_voice_falls_back_to_platform_default() {
        let mut synth = mock_with(voices());
        synth
            .expect_speak()
            .withf(|u| u.voice.is_none() && (u.rate - 1.5).abs() < f32::EPSILON)
            .returning(|_| Ok(()))
            .once();
        synth.expect_cancel().return_const(());
        let mut controller = PlaybackController::new(Box::new(synth));

        assert!(controller.speak("text", Some("missing"), 1.5).is_some());
    }

    #[test]
    fn test_empty_text_or_no_voices_is_silent() {
        let mut synth = mock_with(Vec::new());
        synth.expect_speak().never();
        synth.expect_cancel().never();
        let mut controller = PlaybackController::new(Box::new(synth));

        assert!(controller.speak("   ", None, 1.0).is_none());
        assert!(controller.speak("hello", Some("en-samantha"), 1.0).is_none());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_synthesis_error_returns_to_idle() {
        let mut synth = mock_with(voices());
        synth.expect_speak().returning(|_| Ok(()));
        synth.expect_cancel().return_const(());
        let mut controller = PlaybackController::new(Box::new(synth));

        let id = controller.speak("hi", None, 1.0).unwrap();
        controller.on_event(SynthesisEvent::Started(id));
        let state = controller.on_event(SynthesisEvent::Error(id, SynthesisErrorKind::AudioBusy));
        assert_eq!(state, PlaybackState::Idle);
        assert_eq!(controller.last_error(), Some(SynthesisErrorKind::AudioBusy));
    }

    #[test]
    fn test_rejected_speak_stays_idle() {
        let mut synth = mock_with(voices());
        synth
            .expect_speak()
            .returning(|_| Err(PlatformError::Busy));
        synth.expect_cancel().return_const(());
        let mut controller = PlaybackController::new(Box::new(synth));

        assert!(controller.speak("hi", None, 1.0).is_none());
        assert_eq!(controller.active_utterance(), None);
        assert_eq!(controller.last_error(), Some(SynthesisErrorKind::SynthesisFailed));
    }

    #[test]
    fn test_toggle_uses_selected_voice_and_rate() {
        let mut synth = mock_with(voices());
        synth
            .expect_speak()
            .withf(|u| {
                u.voice.as_ref().map(|v| v.id.as_str()) == Some("en-daniel")
                    && (u.rate - 2.0).abs() < f32::EPSILON
            })
            .returning(|_| Ok(()))
            .once();
        synth.expect_cancel().return_const(()).times(1);
        let mut controller = PlaybackController::new(Box::new(synth));
        controller.select_voice("en-daniel");
        controller.set_rate(3.0);

        controller.toggle("Read this");
        assert!(controller.active_utterance().is_some());
        controller.toggle("Read this");
        assert_eq!(controller.active_utterance(), None);
    }

    #[test]
    fn test_drop_cancels_and_unsubscribes() {
        let mut synth = MockSpeechSynthesizer::new();
        synth.expect_watch_voices().return_const(()).times(1);
        synth.expect_unwatch_voices().return_const(()).times(1);
        synth.expect_voices().returning(voices);
        synth.expect_speak().returning(|_| Ok(()));
        synth.expect_cancel().return_const(()).times(1);

        let mut controller = PlaybackController::new(Box::new(synth));
        let id = controller.speak("bye", None, 1.0).unwrap();
        controller.on_event(SynthesisEvent::Started(id));
        drop(controller);
    }
}
