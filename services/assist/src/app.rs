use crate::console_speech::{ConsoleRecognizer, ConsoleSynthesizer, EventTx, SpeechFeed};
use crate::document::load_document;
use crate::repl::{ConsoleCommand, HELP};
use anyhow::Result;
use assist_core::collaborator::{DocumentExtractor, ResponseGenerator};
use assist_core::platform::SpeechRecognizer;
use assist_core::profile::default_catalog;
use assist_core::{
    AssistSession, DictationController, PlatformEvent, PlaybackController, SettingChange,
};
use std::path::Path;

/// Everything behind the console: the form state and both speech controllers.
///
/// Dropping the app tears down the controllers, which stops any capture or
/// playback still running.
pub struct ConsoleApp {
    session: AssistSession,
    dictation: DictationController,
    playback: PlaybackController,
    feed: Option<SpeechFeed>,
    generator: Box<dyn ResponseGenerator + Send + Sync>,
}

impl ConsoleApp {
    pub fn new(
        generator: Box<dyn ResponseGenerator + Send + Sync>,
        events: EventTx,
        dictation_enabled: bool,
    ) -> Self {
        let session = AssistSession::new();

        let (recognizer, feed) = if dictation_enabled {
            let recognizer = ConsoleRecognizer::new(events.clone());
            let feed = recognizer.feed();
            (Some(Box::new(recognizer) as Box<dyn SpeechRecognizer>), Some(feed))
        } else {
            (None, None)
        };
        let dictation = DictationController::with_recognizer(recognizer, session.prompt());
        let playback = PlaybackController::new(Box::new(ConsoleSynthesizer::new(events)));

        Self {
            session,
            dictation,
            playback,
            feed,
            generator,
        }
    }

    pub fn session(&self) -> &AssistSession {
        &self.session
    }

    pub fn dictation(&self) -> &DictationController {
        &self.dictation
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackController {
        &mut self.playback
    }

    pub fn toggle_profile(&mut self, id: &str) {
        let selection = self.session.toggle_profile(id);
        println!("Profiles: {}", selection.iter().collect::<Vec<_>>().join(", "));
    }

    /// Loads and extracts a document. Failures are reported and leave the session as it was.
    pub async fn attach(&mut self, extractor: &(dyn DocumentExtractor + Send + Sync), path: &Path) -> Result<()> {
        let document = load_document(path)?;
        self.session.attach_document(extractor, document).await?;
        println!("Attached {}", path.display());
        Ok(())
    }

    /// Routes a platform callback to the controller that owns the resource.
    pub fn on_event(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::Recognition(event) => {
                self.dictation.on_event(event);
            }
            PlatformEvent::Synthesis(event) => {
                self.playback.on_event(event);
            }
        }
    }

    pub async fn handle(&mut self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Profiles => {
                for profile in default_catalog() {
                    let mark = if self.session.selection().contains(&profile.id) { "x" } else { " " };
                    println!("[{mark}] {} - {}", profile.id, profile.description);
                }
            }
            ConsoleCommand::Profile(id) => self.toggle_profile(&id),
            ConsoleCommand::Type(text) => self.session.prompt().set(&text),
            ConsoleCommand::Clear => self.session.prompt().clear(),
            ConsoleCommand::Dictate => {
                if !self.dictation.is_available() {
                    println!("Dictation is not available.");
                    return;
                }
                self.dictation.toggle();
            }
            ConsoleCommand::Hear(text) => match &self.feed {
                Some(feed) if feed.hear(&text) => {}
                Some(_) => println!("Not listening. Type 'dictate' first."),
                None => println!("Dictation is not available."),
            },
            ConsoleCommand::Ask => {
                let result = self
                    .session
                    .submit(self.generator.as_ref())
                    .await
                    .map(str::to_string);
                match result {
                    Ok(response) => {
                        println!("\n{response}\n");
                        if self.session.customization_visible() {
                            println!("Display settings are available: font-size, line-height, font.");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            ConsoleCommand::Speak => {
                let voice = self.playback.selected_voice().map(str::to_string);
                let rate = self.playback.rate();
                match self.session.response() {
                    Some(text) => {
                        self.playback.speak(text, voice.as_deref(), rate);
                    }
                    None => println!("There is no response to read yet."),
                }
            }
            ConsoleCommand::Stop => self.playback.stop(),
            ConsoleCommand::Voices => {
                let selected = self.playback.selected_voice();
                for voice in self.playback.voices() {
                    let mark = if Some(voice.id.as_str()) == selected { "*" } else { " " };
                    println!("{mark} {} ({}, {})", voice.id, voice.name, voice.lang);
                }
            }
            ConsoleCommand::Voice(id) => {
                if !self.playback.select_voice(&id) {
                    println!("Unknown voice '{id}'. Type 'voices' for a list.");
                }
            }
            ConsoleCommand::Rate(rate) => self.playback.set_rate(rate),
            ConsoleCommand::FontSize(v) => self.update_setting(SettingChange::FontSize(v)),
            ConsoleCommand::LineHeight(v) => self.update_setting(SettingChange::LineHeight(v)),
            ConsoleCommand::Font(f) => self.update_setting(SettingChange::FontFamily(f)),
            ConsoleCommand::Show => self.show(),
            ConsoleCommand::Quit => {}
        }
    }

    fn update_setting(&mut self, change: SettingChange) {
        if !self.session.customization_visible() {
            println!("Display settings need a response and a reading, writing or vision profile.");
            return;
        }
        self.session.update_setting(change);
    }

    fn show(&self) {
        println!("Question: {}", self.session.prompt().get());
        println!(
            "Profiles: {}",
            self.session.selection().iter().collect::<Vec<_>>().join(", ")
        );
        if let Some(name) = self.session.document_name() {
            println!("Document: {name}");
        }
        println!("Dictation: {:?}, playback: {:?}", self.dictation.state(), self.playback.state());
        if let Some(response) = self.session.response() {
            println!("Response:\n{response}");
        }
        if self.session.customization_visible() {
            let settings = self.session.settings();
            println!(
                "Display: font {}, size {:.1}em, line height {:.1}",
                settings.font_family, settings.font_size, settings.line_height
            );
        }
    }
}
