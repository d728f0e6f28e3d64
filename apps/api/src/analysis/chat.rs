//! Follow-up Query Client: free-text questions grounded in a finished analysis.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::analysis::models::AnalysisResult;
use crate::analysis::prompts::{EMPTY_ANSWER_FALLBACK, FOLLOW_UP_PROMPT_TEMPLATE};
use crate::analysis::AnalysisError;
use crate::llm_client::prompts::{language_instruction, GROUNDING_INSTRUCTION};
use crate::llm_client::{ModelRequest, ModelService, Part};

/// More latitude in phrasing than the evaluation call; grounding is enforced
/// by the instruction, not the temperature.
pub const FOLLOW_UP_TEMPERATURE: f32 = 0.7;

#[derive(Clone)]
pub struct FollowUpClient {
    model: Arc<dyn ModelService>,
    response_language: String,
}

impl FollowUpClient {
    pub fn new(model: Arc<dyn ModelService>, response_language: impl Into<String>) -> Self {
        Self {
            model,
            response_language: response_language.into(),
        }
    }

    /// Answers `question` from `context` only. An empty reply becomes the
    /// fixed fallback answer; a failed exchange is a `ChatFailure`.
    pub async fn ask(
        &self,
        question: &str,
        context: &AnalysisResult,
    ) -> Result<String, AnalysisError> {
        let prompt = self.follow_up_prompt(question, context)?;
        let request = ModelRequest {
            parts: vec![Part::Text(prompt)],
            response_schema: None,
            temperature: FOLLOW_UP_TEMPERATURE,
        };

        let answer = self.model.generate(request).await.map_err(|e| {
            warn!("Follow-up question failed: {e}");
            AnalysisError::ChatFailure(e.to_string())
        })?;

        let answer = answer.trim();
        if answer.is_empty() {
            debug!("Model returned an empty follow-up answer; using fallback");
            return Ok(EMPTY_ANSWER_FALLBACK.to_string());
        }
        Ok(answer.to_string())
    }

    fn follow_up_prompt(
        &self,
        question: &str,
        context: &AnalysisResult,
    ) -> Result<String, AnalysisError> {
        let context = serde_json::to_string(context)
            .map_err(|e| AnalysisError::ChatFailure(format!("could not serialize context: {e}")))?;
        // Substitute the question last so its text is never re-scanned for placeholders.
        Ok(FOLLOW_UP_PROMPT_TEMPLATE
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
            .replace(
                "{language_instruction}",
                &language_instruction(&self.response_language),
            )
            .replace("{context}", &context)
            .replace("{question}", question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::fixtures::two_candidate_result;
    use crate::llm_client::testing::ScriptedModel;

    #[tokio::test]
    async fn test_ask_returns_trimmed_answer() {
        let model = ScriptedModel::replying("  Ana speaks English C1.\n");
        let client = FollowUpClient::new(model, "English");
        let answer = client
            .ask("Which languages does Ana speak?", &two_candidate_result())
            .await
            .unwrap();
        assert_eq!(answer, "Ana speaks English C1.");
    }

    #[tokio::test]
    async fn test_prompt_grounds_question_in_serialized_result() {
        let model = ScriptedModel::replying("ok");
        let client = FollowUpClient::new(model.clone(), "Spanish");
        client
            .ask("Why was Luis scored lower?", &two_candidate_result())
            .await
            .unwrap();

        let request = &model.requests()[0];
        assert!(request.response_schema.is_none());
        assert!((request.temperature - FOLLOW_UP_TEMPERATURE).abs() < f32::EPSILON);
        let prompt: String = request.text_parts().collect();
        assert!(prompt.contains("\"Why was Luis scored lower?\""));
        assert!(prompt.contains("\"bestCandidateId\":\"c1\""));
        assert!(prompt.contains("ONLY on the data provided"));
        assert!(prompt.contains("in Spanish"));
    }

    #[tokio::test]
    async fn test_question_with_placeholder_text_is_kept_literal() {
        let model = ScriptedModel::replying("ok");
        let client = FollowUpClient::new(model.clone(), "English");
        client
            .ask("what is {context}?", &two_candidate_result())
            .await
            .unwrap();
        let prompt: String = model.requests()[0].text_parts().collect();
        assert!(prompt.contains("\"what is {context}?\""));
    }

    #[tokio::test]
    async fn test_empty_answer_uses_fallback() {
        let model = ScriptedModel::replying("");
        let client = FollowUpClient::new(model, "English");
        let answer = client.ask("?", &two_candidate_result()).await.unwrap();
        assert_eq!(answer, EMPTY_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn test_transport_error_is_chat_failure() {
        let model = ScriptedModel::failing(503, "unavailable");
        let client = FollowUpClient::new(model, "English");
        let err = client.ask("?", &two_candidate_result()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ChatFailure(_)));
    }
}
