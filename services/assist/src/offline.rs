use anyhow::Result;
use assist_core::collaborator::{GenerationRequest, ResponseGenerator};
use assist_core::instructions::NOT_FOUND_ANSWER;
use async_trait::async_trait;

/// A simulated `ResponseGenerator`.
///
/// Makes no network calls. It answers from the attached document when there is
/// one, by quoting the sentences that share words with the question, so the
/// console front end can be exercised end to end without an API key.
pub struct OfflineResponder;

const MIN_WORD_LEN: usize = 4;

fn keywords(prompt: &str) -> Vec<String> {
    prompt
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= MIN_WORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl ResponseGenerator for OfflineResponder {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let profiles = request.selection.iter().collect::<Vec<_>>().join(", ");

        let Some(document) = request.document_text.as_deref() else {
            return Ok(format!(
                "(offline) You asked: \"{}\". Profiles applied: {}. \
                 Attach a document or configure a response provider for a real answer.",
                request.prompt, profiles
            ));
        };

        let words = keywords(&request.prompt);
        let matches: Vec<&str> = document
            .split_inclusive(['.', '!', '?'])
            .map(str::trim)
            .filter(|sentence| {
                let lower = sentence.to_lowercase();
                words.iter().any(|w| lower.contains(w.as_str()))
            })
            .collect();

        if matches.is_empty() {
            Ok(NOT_FOUND_ANSWER.to_string())
        } else {
            Ok(matches.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assist_core::SelectionState;

    fn request(prompt: &str, document: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            document_text: document.map(str::to_string),
            selection: SelectionState::standard(),
            instructions: String::new(),
        }
    }

    #[tokio::test]
    async fn test_answers_from_matching_sentences() {
        let doc = "Plants need light. Chlorophyll absorbs light energy! Roots take up water.";
        let answer = OfflineResponder
            .generate(&request("What does chlorophyll do?", Some(doc)))
            .await
            .unwrap();
        assert_eq!(answer, "Chlorophyll absorbs light energy!");
    }

    #[tokio::test]
    async fn test_unrelated_question_gets_not_found() {
        let answer = OfflineResponder
            .generate(&request("Explain volcanoes", Some("Plants need light.")))
            .await
            .unwrap();
        assert_eq!(answer, NOT_FOUND_ANSWER);
    }

    #[tokio::test]
    async fn test_without_document_echoes_question() {
        let answer = OfflineResponder
            .generate(&request("Explain photosynthesis", None))
            .await
            .unwrap();
        assert!(answer.contains("Explain photosynthesis"));
        assert!(answer.contains("Standard"));
    }
}
