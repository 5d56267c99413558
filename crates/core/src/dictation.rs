use crate::platform::{PlatformError, RecognitionErrorKind, RecognitionEvent, SpeechRecognizer};
use crate::prompt::PromptText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationState {
    Idle,
    Listening,
    /// Passed through on a recognizer failure before settling back to `Idle`.
    Erroring,
}

#[derive(Debug, thiserror::Error)]
pub enum DictationError {
    #[error("speech input is not supported on this platform")]
    Unavailable,
    #[error("cannot {action} dictation while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: DictationState,
    },
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Drives a speech recognizer and commits final transcripts into the prompt.
///
/// The recognizer is handed over once at construction and lives as long as the
/// controller. The prompt is held as a shared handle and read at commit time, so
/// edits to the prompt never require a new recognizer.
pub struct DictationController {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    prompt: PromptText,
    state: DictationState,
    start_pending: bool,
    last_error: Option<RecognitionErrorKind>,
}

impl DictationController {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, prompt: PromptText) -> Self {
        Self::with_recognizer(Some(recognizer), prompt)
    }

    /// A controller for a platform without speech input. Its toggle does nothing.
    pub fn unavailable(prompt: PromptText) -> Self {
        Self::with_recognizer(None, prompt)
    }

    pub fn with_recognizer(recognizer: Option<Box<dyn SpeechRecognizer>>, prompt: PromptText) -> Self {
        Self {
            recognizer,
            prompt,
            state: DictationState::Idle,
            start_pending: false,
            last_error: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == DictationState::Listening
    }

    /// The most recent recognizer failure, if any. Never shown to the user.
    pub fn last_error(&self) -> Option<RecognitionErrorKind> {
        self.last_error
    }

    /// Asks the recognizer to begin. The state only changes once the recognizer
    /// reports `Started`.
    pub fn start(&mut self) -> Result<(), DictationError> {
        if self.state != DictationState::Idle || self.start_pending {
            return Err(DictationError::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }
        let recognizer = self.recognizer.as_mut().ok_or(DictationError::Unavailable)?;

        if let Err(e) = recognizer.start() {
            tracing::warn!("Speech recognizer refused to start: {}", e);
            self.reset();
            return Err(e.into());
        }
        tracing::debug!("Dictation start requested");
        self.start_pending = true;
        Ok(())
    }

    /// Asks the recognizer to finish. Results already in flight are still committed.
    pub fn stop(&mut self) -> Result<(), DictationError> {
        if self.state != DictationState::Listening {
            return Err(DictationError::InvalidTransition {
                action: "stop",
                state: self.state,
            });
        }
        let recognizer = self.recognizer.as_mut().ok_or(DictationError::Unavailable)?;

        if let Err(e) = recognizer.stop() {
            tracing::warn!("Speech recognizer failed to stop: {}", e);
            recognizer.abort();
            self.reset();
            return Err(e.into());
        }
        tracing::debug!("Dictation stop requested");
        Ok(())
    }

    /// The user-facing mic button. Failures are logged and swallowed.
    pub fn toggle(&mut self) {
        if !self.is_available() {
            return;
        }
        let result = match self.state {
            DictationState::Idle if !self.start_pending => self.start(),
            DictationState::Listening => self.stop(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!("Dictation toggle failed: {}", e);
        }
    }

    /// Applies a recognizer callback and returns the resulting state.
    pub fn on_event(&mut self, event: RecognitionEvent) -> DictationState {
        match event {
            RecognitionEvent::Started => {
                if self.start_pending {
                    self.start_pending = false;
                    self.state = DictationState::Listening;
                    tracing::info!("Listening...");
                } else {
                    tracing::debug!("Ignoring recognizer start that was not requested");
                }
            }
            RecognitionEvent::Result(fragments) => {
                if self.state != DictationState::Listening {
                    tracing::debug!("Dropping recognition result received while {:?}", self.state);
                    return self.state;
                }
                for fragment in fragments.iter().filter(|f| f.is_final) {
                    let text = fragment.transcript.trim();
                    if text.is_empty() {
                        continue;
                    }
                    self.prompt.append_fragment(text);
                    tracing::debug!("Committed dictated text: \"{}\"", text);
                }
            }
            RecognitionEvent::Error(kind) => {
                self.state = DictationState::Erroring;
                self.last_error = Some(kind);
                tracing::warn!("Speech recognition error: {}", kind);
                self.reset();
            }
            RecognitionEvent::Ended => {
                if self.state != DictationState::Idle || self.start_pending {
                    tracing::info!("Dictation ended");
                }
                self.reset();
            }
        }
        self.state
    }

    fn reset(&mut self) {
        self.start_pending = false;
        self.state = DictationState::Idle;
    }
}

impl Drop for DictationController {
    fn drop(&mut self) {
        if self.state == DictationState::Listening || self.start_pending {
            if let Some(recognizer) = self.recognizer.as_mut() {
                tracing::debug!("Aborting active dictation on teardown");
                recognizer.abort();
            }
        }
    }
}
