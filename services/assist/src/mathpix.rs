use anyhow::{Context, Result};
use assist_core::collaborator::{CollaboratorError, Document, DocumentExtractor, DocumentKind};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
pub struct MathpixResponse {
    pub latex_styled: Option<String>,
    pub error: Option<String>,
}

/// Reads scanned pages and PDFs through the Mathpix `v3/text` OCR endpoint.
pub struct MathpixExtractor {
    client: Client,
    app_id: SecretString,
    app_key: SecretString,
    url: String,
}

impl MathpixExtractor {
    pub fn new(app_id: SecretString, app_key: SecretString, url: String) -> Self {
        Self {
            client: Client::new(),
            app_id,
            app_key,
            url,
        }
    }
}

/// Asks for a single `latex_styled` string holding both prose and math.
pub fn options_json() -> serde_json::Value {
    serde_json::json!({
        "formats": ["latex_styled"],
        "math_inline_delimiters": ["$", "$"],
        "text_delimiters": ["\n", "\n"],
        "conversion_delimiters": ["$$", "$$"]
    })
}

pub fn response_text(response: MathpixResponse) -> Result<String> {
    if let Some(error) = response.error {
        return Err(CollaboratorError::UnsupportedDocument(format!("OCR failed: {error}")).into());
    }
    match response.latex_styled.map(|t| t.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(CollaboratorError::NoText.into()),
    }
}

#[async_trait]
impl DocumentExtractor for MathpixExtractor {
    async fn extract(&self, document: &Document) -> Result<String> {
        let kind = match document.kind() {
            Some(kind @ (DocumentKind::Pdf | DocumentKind::Png | DocumentKind::Jpeg)) => kind,
            _ => return Err(CollaboratorError::UnsupportedDocument(document.name.clone()).into()),
        };
        if document.bytes.is_empty() {
            return Err(CollaboratorError::EmptyDocument.into());
        }

        let file = Part::bytes(document.bytes.clone())
            .file_name(document.name.clone())
            .mime_str(kind.mime_type())
            .context("Invalid document MIME type")?;
        let options = Part::text(options_json().to_string())
            .mime_str("application/json")
            .context("Invalid options MIME type")?;
        let form = Form::new().part("file", file).part("options_json", options);

        tracing::debug!("POST {} ({}, {} bytes)", self.url, document.name, document.bytes.len());
        let resp = self
            .client
            .post(&self.url)
            .header("app_id", self.app_id.expose_secret())
            .header("app_key", self.app_key.expose_secret())
            .multipart(form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Failed to reach the Mathpix API")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::error!("Mathpix API returned {}: {}", status, detail);
            anyhow::bail!("OCR service returned {status}. Check the Mathpix keys and the document quality.");
        }

        let parsed = resp
            .json::<MathpixResponse>()
            .await
            .context("Failed to parse Mathpix response")?;
        response_text(parsed)
    }
}
