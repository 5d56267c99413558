use crate::collaborator::{CollaboratorError, Document, DocumentExtractor, GenerationRequest, ResponseGenerator};
use crate::customization::{CustomizationSettings, DisplayCustomizationStore, SettingChange};
use crate::instructions::system_instruction;
use crate::profile::{ProfileSelectionEngine, SelectionState};
use crate::prompt::PromptText;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("please enter a question first")]
    EmptyPrompt,
    #[error("the document could not be used: {0:#}")]
    Document(anyhow::Error),
    #[error("no response could be generated: {0:#}")]
    Generation(anyhow::Error),
}

/// The state behind one question-and-answer form.
///
/// Owns the profile selection, display settings, the prompt buffer, the text of
/// the attached document and the latest response. The media controllers are kept
/// outside and share only the prompt handle.
pub struct AssistSession {
    profiles: ProfileSelectionEngine,
    customization: DisplayCustomizationStore,
    prompt: PromptText,
    document_name: Option<String>,
    document_text: Option<String>,
    response: Option<String>,
}

impl Default for AssistSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AssistSession {
    pub fn new() -> Self {
        let profiles = ProfileSelectionEngine::new();
        let customization = DisplayCustomizationStore::new(profiles.subscribe());
        Self {
            profiles,
            customization,
            prompt: PromptText::new(),
            document_name: None,
            document_text: None,
            response: None,
        }
    }

    /// A handle to the prompt buffer, shared with whoever edits it.
    pub fn prompt(&self) -> PromptText {
        self.prompt.clone()
    }

    pub fn selection(&self) -> &SelectionState {
        self.profiles.selection()
    }

    pub fn toggle_profile(&mut self, id: &str) -> SelectionState {
        self.profiles.toggle(id)
    }

    pub fn settings(&self) -> CustomizationSettings {
        self.customization.settings()
    }

    pub fn update_setting(&mut self, change: SettingChange) -> CustomizationSettings {
        self.customization.update(change)
    }

    pub fn customization_visible(&self) -> bool {
        self.customization.controls_visible(self.response.is_some())
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    /// Extracts and keeps the text of `document` for later questions.
    pub async fn attach_document<E>(&mut self, extractor: &E, document: Document) -> Result<(), SessionError>
    where
        E: DocumentExtractor + Sync + ?Sized,
    {
        tracing::info!("Extracting text from '{}'", document.name);
        let text = extractor.extract(&document).await.map_err(|e| {
            tracing::error!("Document extraction failed for '{}': {:#}", document.name, e);
            SessionError::Document(e)
        })?;

        if text.trim().is_empty() {
            tracing::warn!("No readable text in '{}'", document.name);
            return Err(SessionError::Document(CollaboratorError::NoText.into()));
        }

        tracing::debug!("Extracted {} characters from '{}'", text.len(), document.name);
        self.document_name = Some(document.name);
        self.document_text = Some(text);
        Ok(())
    }

    pub fn clear_document(&mut self) {
        self.document_name = None;
        self.document_text = None;
    }

    /// Sends the current prompt to `generator` and keeps the response.
    ///
    /// A failure keeps the previous response, and never touches the prompt,
    /// the selection or the display settings.
    pub async fn submit<G>(&mut self, generator: &G) -> Result<&str, SessionError>
    where
        G: ResponseGenerator + Sync + ?Sized,
    {
        if self.prompt.is_blank() {
            return Err(SessionError::EmptyPrompt);
        }

        let selection = self.profiles.selection().clone();
        let request = GenerationRequest {
            prompt: self.prompt.get().trim().to_string(),
            instructions: system_instruction(&selection, self.document_text.as_deref()),
            document_text: self.document_text.clone(),
            selection,
        };
        tracing::info!(
            "Submitting question with profiles {:?}",
            request.selection.iter().collect::<Vec<_>>()
        );

        match generator.generate(&request).await {
            Ok(text) => {
                tracing::debug!("Received response of {} characters", text.len());
                Ok(self.response.insert(text).as_str())
            }
            Err(e) => {
                tracing::error!("Response generation failed: {:#}", e);
                Err(SessionError::Generation(e))
            }
        }
    }
}
