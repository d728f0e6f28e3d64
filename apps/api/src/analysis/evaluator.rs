//! Evaluation Client: one structured-output exchange per run.
//!
//! Flow: encode (fan-out, one blocking task per document) → join →
//! build request → generate → strip fences → parse → validate.
//! No retry: a failed exchange is terminal for the run.

use std::str::FromStr;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, warn};

use crate::analysis::encoder::{encode_document, Document, EncodedDocument};
use crate::analysis::models::AnalysisResult;
use crate::analysis::request::build_evaluation_request;
use crate::analysis::AnalysisError;
use crate::llm_client::{strip_json_fences, ModelService};

/// What to do with a parsed result that breaks the declared contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Structural issues demote the result to `EmptyOrMalformedResponse`.
    /// Total/sum mismatches are logged and kept.
    #[default]
    Strict,
    /// Every issue is logged; the result is kept as returned.
    Trust,
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ValidationPolicy::Strict),
            "trust" => Ok(ValidationPolicy::Trust),
            other => Err(format!("unknown validation policy '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct Evaluator {
    model: Arc<dyn ModelService>,
    response_language: String,
    policy: ValidationPolicy,
}

impl Evaluator {
    pub fn new(
        model: Arc<dyn ModelService>,
        response_language: impl Into<String>,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            model,
            response_language: response_language.into(),
            policy,
        }
    }

    pub async fn evaluate(&self, documents: Vec<Document>) -> Result<AnalysisResult, AnalysisError> {
        if documents.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let count = documents.len();
        let encoded = encode_all(documents).await?;
        let request = build_evaluation_request(encoded, &self.response_language)?;

        info!("Requesting evaluation of {count} document(s)");
        let text = self.model.generate(request).await?;

        let result = parse_result(&text)?;
        self.validate(result)
    }

    fn validate(&self, result: AnalysisResult) -> Result<AnalysisResult, AnalysisError> {
        let issues = result.check();
        if issues.is_empty() {
            return Ok(result);
        }

        for issue in &issues {
            warn!("Evaluation result issue: {issue}");
        }

        if self.policy == ValidationPolicy::Strict {
            let structural: Vec<String> = issues
                .iter()
                .filter(|i| i.is_structural())
                .map(ToString::to_string)
                .collect();
            if !structural.is_empty() {
                return Err(AnalysisError::EmptyOrMalformedResponse(structural.join("; ")));
            }
        }

        Ok(result)
    }
}

/// Encodes every document on the blocking pool and waits for all of them.
async fn encode_all(documents: Vec<Document>) -> Result<Vec<EncodedDocument>, AnalysisError> {
    let tasks = documents.into_iter().map(|doc| async move {
        tokio::task::spawn_blocking(move || encode_document(&doc))
            .await
            .map_err(|e| AnalysisError::Internal(format!("encoding task failed: {e}")))?
    });
    try_join_all(tasks).await
}

fn parse_result(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(AnalysisError::EmptyOrMalformedResponse(
            "empty response".to_string(),
        ));
    }
    serde_json::from_str(text).map_err(|e| AnalysisError::EmptyOrMalformedResponse(e.to_string()))
}
