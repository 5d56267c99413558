use crate::profile::SelectionState;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::path::Path;

/// The kinds of document a user can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
    PlainText,
}

impl DocumentKind {
    /// Infers the kind from the file extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "txt" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::PlainText => "text/plain",
        }
    }
}

/// An uploaded document.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            bytes,
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_name(&self.name)
    }
}

/// Failures reported by the upstream collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),
    #[error("the document is empty")]
    EmptyDocument,
    #[error("the document is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("no readable text could be extracted from the document")]
    NoText,
    #[error("response generation failed: {0}")]
    Generation(String),
}

/// Everything the response generator needs for one question.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub document_text: Option<String>,
    pub selection: SelectionState,
    /// The system instruction built from the selection and document.
    pub instructions: String,
}

/// Turns an uploaded document into text.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentExtractor {
    async fn extract(&self, document: &Document) -> Result<String>;
}

/// Produces a response for a question. Typically a remote text-generation service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResponseGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
