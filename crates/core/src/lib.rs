pub mod collaborator;
pub mod customization;
pub mod dictation;
pub mod instructions;
pub mod platform;
pub mod playback;
pub mod profile;
pub mod prompt;
pub mod session;

pub use customization::{CustomizationSettings, DisplayCustomizationStore, FontFamily, SettingChange};
pub use dictation::{DictationController, DictationState};
pub use playback::{PlaybackController, PlaybackState};
pub use profile::{Profile, ProfileSelectionEngine, SelectionState};
pub use prompt::PromptText;
pub use session::{AssistSession, SessionError};

/// Events delivered by the platform speech resources to the front end's loop.
///
/// Each variant is routed to the controller that owns the resource.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    Recognition(platform::RecognitionEvent),
    Synthesis(platform::SynthesisEvent),
}
