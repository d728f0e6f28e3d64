//! Evaluation Request Builder: pure assembly of the outbound evaluation call.
//!
//! Parts order: every encoded résumé as inline data, then the instruction text.
//! The declared response schema mirrors `AnalysisResult` field for field.

use serde_json::{json, Value};
use tracing::debug;

use crate::analysis::encoder::EncodedDocument;
use crate::analysis::models::{MAX_SUB_SCORE, MAX_TOTAL_SCORE};
use crate::analysis::prompts::EVALUATION_PROMPT_TEMPLATE;
use crate::analysis::AnalysisError;
use crate::llm_client::prompts::{language_instruction, STRICT_JSON_INSTRUCTION};
use crate::llm_client::{ModelRequest, Part};

/// Low temperature: literal extraction over creative variation.
pub const EVALUATION_TEMPERATURE: f32 = 0.1;

pub fn build_evaluation_request(
    documents: Vec<EncodedDocument>,
    response_language: &str,
) -> Result<ModelRequest, AnalysisError> {
    if documents.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let mut parts: Vec<Part> = documents
        .into_iter()
        .map(|doc| {
            debug!("Attaching '{}' as {}", doc.file_name, doc.media_type);
            Part::InlineData {
                media_type: doc.media_type,
                data: doc.data,
            }
        })
        .collect();
    parts.push(Part::Text(evaluation_prompt(response_language)));

    Ok(ModelRequest {
        parts,
        response_schema: Some(response_schema()),
        temperature: EVALUATION_TEMPERATURE,
    })
}

pub fn evaluation_prompt(response_language: &str) -> String {
    EVALUATION_PROMPT_TEMPLATE
        .replace("{json_instruction}", STRICT_JSON_INSTRUCTION)
        .replace(
            "{language_instruction}",
            &language_instruction(response_language),
        )
}

fn sub_score(description: &str) -> Value {
    json!({
        "type": "NUMBER",
        "minimum": 0,
        "maximum": MAX_SUB_SCORE,
        "description": description,
    })
}

/// The structured-output schema, in the provider's OpenAPI subset.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "candidates": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING", "description": "Identifier unique within this result" },
                        "name": { "type": "STRING" },
                        "surname": { "type": "STRING" },
                        "experienceYears": { "type": "NUMBER", "minimum": 0 },
                        "scores": {
                            "type": "OBJECT",
                            "properties": {
                                "knowledge": sub_score("Score from 0 to 20"),
                                "skills": sub_score("Score from 0 to 20"),
                                "seniority": sub_score("Score from 0 to 20"),
                                "languages": sub_score("Score from 0 to 20. Must be 0 if the CV mentions no languages."),
                                "others": sub_score("Score from 0 to 20"),
                                "total": {
                                    "type": "NUMBER",
                                    "minimum": 0,
                                    "maximum": MAX_TOTAL_SCORE,
                                    "description": "Sum of all five scores (max 100)",
                                },
                            },
                            "required": ["knowledge", "skills", "seniority", "languages", "others", "total"],
                        },
                        "summary": { "type": "STRING", "description": "Short summary of the professional profile" },
                        "recommendationReason": { "type": "STRING", "description": "Why the candidate is or is not a fit" },
                        "uniqueAttributes": { "type": "STRING", "description": "Separate paragraph on knowledge or skills this candidate has and the others do NOT" },
                        "languagesDetail": { "type": "STRING", "description": "Which languages the candidate speaks (e.g. 'English C1, German B2')" },
                    },
                    "required": [
                        "id", "name", "surname", "experienceYears", "scores",
                        "summary", "recommendationReason", "languagesDetail"
                    ],
                },
            },
            "bestCandidateId": { "type": "STRING" },
            "overallRecommendation": { "type": "STRING", "description": "Final expert recommendation for the recruiter" },
        },
        "required": ["candidates", "bestCandidateId", "overallRecommendation"],
    })
}
