// Candidate analysis: encode résumés, ask the model for a structured
// comparative evaluation, validate it, and answer follow-up questions.
// All model calls go through llm_client::ModelService.

pub mod chat;
pub mod encoder;
pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod report;
pub mod request;

use thiserror::Error;

use crate::llm_client::LlmError;

pub use chat::FollowUpClient;
pub use encoder::Document;
pub use evaluator::{Evaluator, ValidationPolicy};
pub use models::AnalysisResult;

/// Failure taxonomy for evaluation runs and follow-up questions.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No documents were submitted")]
    EmptyInput,

    #[error("Could not read '{file_name}': {reason}")]
    ReadFailure { file_name: String, reason: String },

    #[error("The AI service could not be reached: {0}")]
    Transport(#[from] LlmError),

    #[error("The AI service returned an empty or malformed response: {0}")]
    EmptyOrMalformedResponse(String),

    #[error("The analysis did not finish within {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Follow-up question failed: {0}")]
    ChatFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
