use anyhow::{Context, Result};
use assist_core::collaborator::{CollaboratorError, GenerationRequest, ResponseGenerator};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Generates responses with the Gemini `generateContent` REST endpoint.
pub struct GeminiResponder {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiResponder {
    pub fn new(api_key: SecretString, model: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// The JSON body for one question: the instruction as the system turn, the
/// prompt as the single user turn.
pub fn request_body(request: &GenerationRequest) -> serde_json::Value {
    serde_json::json!({
        "system_instruction": {
            "parts": [{ "text": request.instructions }]
        },
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }
        ]
    })
}

/// Joins the text parts of the first candidate.
pub fn response_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CollaboratorError::Generation(format!("prompt was blocked: {reason}")).into());
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CollaboratorError::Generation("no candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(CollaboratorError::Generation(format!("empty response (finish reason: {reason})")).into());
    }
    Ok(text)
}

#[async_trait]
impl ResponseGenerator for GeminiResponder {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = request_body(request);
        tracing::debug!("POST {}", self.endpoint());

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::error!("Gemini API returned {}: {}", status, detail);
            return Err(CollaboratorError::Generation(format!("Gemini API returned {status}")).into());
        }

        let parsed = resp
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse Gemini response")?;
        response_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assist_core::SelectionState;

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "Explain photosynthesis".to_string(),
            document_text: None,
            selection: SelectionState::standard(),
            instructions: "Be clear.".to_string(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body(&request());
        assert_eq!(body["system_instruction"]["parts"][0]["text"], "Be clear.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Explain photosynthesis");
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let responder = GeminiResponder::new(
            SecretString::from("key".to_string()),
            "gemini-2.5-flash".to_string(),
            "https://example.test/v1beta/".to_string(),
        );
        assert_eq!(
            responder.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [
                {
                    "content": { "parts": [{ "text": "Plants " }, { "text": "make food." }], "role": "model" },
                    "finishReason": "STOP"
                }
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response_text(parsed).unwrap(), "Plants make food.");
    }

    #[test]
    fn test_blocked_prompt_is_an_error() {
        let json = r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let err = response_text(parsed).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_empty_candidate_is_an_error() {
        let json = r#"{ "candidates": [ { "finishReason": "MAX_TOKENS" } ] }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let err = response_text(parsed).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }
}
