use anyhow::{Context, Result};
use assist_core::collaborator::{CollaboratorError, Document, DocumentExtractor, DocumentKind};
use async_trait::async_trait;
use std::path::Path;

/// Uploads above this size are refused.
pub const MAX_DOCUMENT_BYTES: u64 = 16 * 1024 * 1024;

/// Reads a document from disk, keeping only its file name.
pub fn load_document(path: &Path) -> Result<Document> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?
        .len();
    if size > MAX_DOCUMENT_BYTES {
        return Err(CollaboratorError::TooLarge {
            size,
            limit: MAX_DOCUMENT_BYTES,
        }
        .into());
    }
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .context("Could not get file name for document")?;
    Ok(Document::new(name, bytes))
}

/// Extracts text from plain-text documents. Scans and PDFs need an OCR
/// service and are rejected with a validation error.
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract(&self, document: &Document) -> Result<String> {
        match document.kind() {
            Some(DocumentKind::PlainText) => {}
            Some(kind) => {
                return Err(CollaboratorError::UnsupportedDocument(format!(
                    "{} ({}) needs OCR, which is not configured",
                    document.name,
                    kind.mime_type()
                ))
                .into());
            }
            None => {
                return Err(CollaboratorError::UnsupportedDocument(document.name.clone()).into());
            }
        }

        if document.bytes.is_empty() {
            return Err(CollaboratorError::EmptyDocument.into());
        }

        let text = String::from_utf8(document.bytes.clone())
            .with_context(|| format!("{} is not valid UTF-8 text", document.name))?;
        Ok(text.trim().to_string())
    }
}

/// Reads plain text locally and hands scans and PDFs to an OCR extractor, if one is configured.
pub struct DocumentRouter {
    ocr: Option<Box<dyn DocumentExtractor + Send + Sync>>,
}

impl DocumentRouter {
    pub fn new(ocr: Option<Box<dyn DocumentExtractor + Send + Sync>>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl DocumentExtractor for DocumentRouter {
    async fn extract(&self, document: &Document) -> Result<String> {
        match (document.kind(), &self.ocr) {
            (Some(DocumentKind::PlainText), _) | (None, _) | (_, None) => {
                PlainTextExtractor.extract(document).await
            }
            (Some(_), Some(ocr)) => ocr.extract(document).await,
        }
    }
}
