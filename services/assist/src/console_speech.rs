//! Terminal stand-ins for the platform speech resources.
//!
//! The synthesizer "speaks" by printing the utterance word by word, paced by
//! the rate. The recognizer is fed typed text through a `SpeechFeed`, which
//! plays the role of the microphone. Both report back through the same event
//! channel the front end's loop reads.

use assist_core::PlatformEvent;
use assist_core::platform::{
    PlatformError, RecognitionEvent, RecognitionFragment, SpeechRecognizer, SpeechSynthesizer,
    SynthesisErrorKind, SynthesisEvent, Utterance, UtteranceId, Voice,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Base time per spoken word at rate 1.0.
const WORD_MILLIS: u64 = 250;
/// How long the voice list takes to "load" after subscribing.
const VOICE_LOAD_DELAY_MS: u64 = 50;

pub type EventTx = UnboundedSender<PlatformEvent>;

fn send(events: &EventTx, event: PlatformEvent) {
    if let Err(e) = events.send(event) {
        tracing::warn!("Failed to deliver speech event: {:?}", e.0);
    }
}

fn installed_voices() -> Vec<Voice> {
    vec![
        Voice::new("samantha", "Samantha", "en-US"),
        Voice::new("daniel", "Daniel", "en-GB"),
        Voice::new("karen", "Karen", "en-AU"),
        Voice::new("amelie", "Amelie", "fr-CA"),
        Voice::new("anna", "Anna", "de-DE"),
    ]
}

pub struct ConsoleSynthesizer {
    events: EventTx,
    voices: Arc<Mutex<Vec<Voice>>>,
    current: Option<(UtteranceId, JoinHandle<()>)>,
    loader: Option<JoinHandle<()>>,
    word_millis: u64,
}

impl ConsoleSynthesizer {
    pub fn new(events: EventTx) -> Self {
        Self {
            events,
            voices: Arc::new(Mutex::new(Vec::new())),
            current: None,
            loader: None,
            word_millis: WORD_MILLIS,
        }
    }

    /// Overrides the per-word pacing.
    pub fn with_word_millis(mut self, word_millis: u64) -> Self {
        self.word_millis = word_millis;
        self
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        match self.voices.lock() {
            Ok(voices) => voices.clone(),
            Err(_) => {
                tracing::error!("Voice list lock poisoned");
                Vec::new()
            }
        }
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), PlatformError> {
        // The platform queues by default; this one only ever plays the newest request.
        self.cancel();

        let events = self.events.clone();
        let pause = Duration::from_millis((self.word_millis as f32 / utterance.rate.max(0.1)) as u64);
        let id = utterance.id;
        let handle = tokio::spawn(async move {
            send(&events, PlatformEvent::Synthesis(SynthesisEvent::Started(id)));
            let voice = utterance
                .voice
                .as_ref()
                .map(|v| v.name.as_str())
                .unwrap_or("default");
            print!("[{voice}] ");
            for word in utterance.text.split_whitespace() {
                print!("{word} ");
                let _ = std::io::stdout().flush();
                tokio::time::sleep(pause).await;
            }
            println!();
            send(&events, PlatformEvent::Synthesis(SynthesisEvent::Ended(id)));
        });
        self.current = Some((id, handle));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some((id, handle)) = self.current.take() {
            if !handle.is_finished() {
                handle.abort();
                println!();
                send(
                    &self.events,
                    PlatformEvent::Synthesis(SynthesisEvent::Error(id, SynthesisErrorKind::Canceled)),
                );
            }
        }
    }

    fn watch_voices(&mut self) {
        if self.loader.is_some() {
            return;
        }
        let events = self.events.clone();
        let voices = self.voices.clone();
        self.loader = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(VOICE_LOAD_DELAY_MS)).await;
            if let Ok(mut list) = voices.lock() {
                *list = installed_voices();
            }
            send(&events, PlatformEvent::Synthesis(SynthesisEvent::VoicesChanged));
        }));
    }

    fn unwatch_voices(&mut self) {
        if let Some(loader) = self.loader.take() {
            loader.abort();
        }
    }
}

/// A recognizer driven by typed text instead of a microphone.
pub struct ConsoleRecognizer {
    events: EventTx,
    capturing: Arc<AtomicBool>,
}

/// The "microphone" end of a `ConsoleRecognizer`.
#[derive(Clone)]
pub struct SpeechFeed {
    events: EventTx,
    capturing: Arc<AtomicBool>,
}

impl ConsoleRecognizer {
    pub fn new(events: EventTx) -> Self {
        Self {
            events,
            capturing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn feed(&self) -> SpeechFeed {
        SpeechFeed {
            events: self.events.clone(),
            capturing: self.capturing.clone(),
        }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self) -> Result<(), PlatformError> {
        if self.capturing.swap(true, Ordering::SeqCst) {
            return Err(PlatformError::Busy);
        }
        send(&self.events, PlatformEvent::Recognition(RecognitionEvent::Started));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        if self.capturing.swap(false, Ordering::SeqCst) {
            send(&self.events, PlatformEvent::Recognition(RecognitionEvent::Ended));
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);
    }
}

impl SpeechFeed {
    /// Delivers `text` as if it had been spoken: first a partial interim
    /// result, then the final transcript. Returns false when not capturing.
    pub fn hear(&self, text: &str) -> bool {
        if !self.capturing.load(Ordering::SeqCst) {
            return false;
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() > 1 {
            let partial = words[..words.len() / 2].join(" ");
            send(
                &self.events,
                PlatformEvent::Recognition(RecognitionEvent::Result(vec![
                    RecognitionFragment::interim(&partial),
                ])),
            );
        }
        send(
            &self.events,
            PlatformEvent::Recognition(RecognitionEvent::Result(vec![
                RecognitionFragment::final_text(text),
            ])),
        );
        true
    }
}
