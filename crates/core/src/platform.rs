//! Platform speech capabilities.
//!
//! Speech input and speech output are owned by the platform. The controllers
//! only ever talk to them through these traits, and the platform reports back
//! by delivering the event enums below to the owning controller.

#[cfg(test)]
use mockall::automock;
use std::fmt;

/// A failure reported by a platform call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("speech resource is busy")]
    Busy,
    #[error("speech resource is unavailable: {0}")]
    Unavailable(String),
    #[error("speech resource failed: {0}")]
    Failed(String),
}

// --- Speech input ---

/// The kinds of failure a recognizer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NotAllowed,
    NoSpeech,
    AudioCapture,
    Network,
    Aborted,
    Other,
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotAllowed => "not-allowed",
            Self::NoSpeech => "no-speech",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::Aborted => "aborted",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// One segment of recognized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionFragment {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionFragment {
    pub fn interim(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            is_final: false,
        }
    }

    pub fn final_text(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            is_final: true,
        }
    }
}

/// Callbacks from a speech recognizer, in the order the platform emits them.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Started,
    Result(Vec<RecognitionFragment>),
    Error(RecognitionErrorKind),
    Ended,
}

/// A speech-to-text resource. Start and stop are requests; the outcome arrives
/// later as a `RecognitionEvent`.
#[cfg_attr(test, automock)]
pub trait SpeechRecognizer {
    fn start(&mut self) -> Result<(), PlatformError>;

    fn stop(&mut self) -> Result<(), PlatformError>;

    /// Ends capture immediately, discarding anything not yet delivered.
    fn abort(&mut self);
}

// --- Speech output ---

/// A synthesis voice as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(id: &str, name: &str, lang: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }

    /// True for `en`, `en-*` and `en_*` language tags.
    pub fn is_english(&self) -> bool {
        let lang = self.lang.to_ascii_lowercase();
        lang == "en" || lang.starts_with("en-") || lang.starts_with("en_")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single request to speak text.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    /// `None` means the platform default voice.
    pub voice: Option<Voice>,
    pub rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisErrorKind {
    Canceled,
    Interrupted,
    AudioBusy,
    VoiceUnavailable,
    SynthesisFailed,
    Other,
}

impl fmt::Display for SynthesisErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Canceled => "canceled",
            Self::Interrupted => "interrupted",
            Self::AudioBusy => "audio-busy",
            Self::VoiceUnavailable => "voice-unavailable",
            Self::SynthesisFailed => "synthesis-failed",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Callbacks from a speech synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Started(UtteranceId),
    Ended(UtteranceId),
    Error(UtteranceId, SynthesisErrorKind),
    VoicesChanged,
}

/// A text-to-speech resource.
#[cfg_attr(test, automock)]
pub trait SpeechSynthesizer {
    /// The full, unfiltered voice list. May be empty until the platform has loaded it.
    fn voices(&self) -> Vec<Voice>;

    fn speak(&mut self, utterance: Utterance) -> Result<(), PlatformError>;

    /// Cancels whatever is speaking or queued.
    fn cancel(&mut self);

    /// Start delivering `SynthesisEvent::VoicesChanged`.
    fn watch_voices(&mut self);

    /// Stop delivering `SynthesisEvent::VoicesChanged`.
    fn unwatch_voices(&mut self);
}
