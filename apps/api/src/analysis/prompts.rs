// Analysis prompt templates.
// All prompts for the analysis module are defined here.

/// Instruction sent after the attached résumés. `{language_instruction}` and
/// `{json_instruction}` are substituted by the request builder.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Act as an expert recruiter and HR specialist.
Analyse the attached CVs and produce an exhaustive comparative evaluation of the candidates.

CRITICAL BUSINESS RULES:
1. LANGUAGES: If a CV contains no explicit information about languages, the score for that category MUST be 0.
2. LANGUAGE COMPARISON: If the candidates speak different languages, state specifically which ones each candidate speaks in the 'languagesDetail' field (e.g. 'English C1, German B2').
3. UNIQUE ATTRIBUTES: If a candidate has a knowledge area, skill or technical certification that NONE of the other candidates has, describe it in detail in a separate paragraph in the 'uniqueAttributes' field.
4. SCORES: Each category is scored from 0 to 20. The total is the sum of the five categories (max 100).

Select the best candidate and put their 'id' in 'bestCandidateId'.
{json_instruction}
{language_instruction}"#;

/// Follow-up question template. `{context}` is the serialized analysis result.
pub const FOLLOW_UP_PROMPT_TEMPLATE: &str = r#"You are an intelligent assistant for an HR analyst.
Based on the following candidate analysis results:
{context}

Answer the analyst's question: "{question}"
{grounding_instruction}
{language_instruction}"#;

/// Returned when the model answers a follow-up question with no text.
pub const EMPTY_ANSWER_FALLBACK: &str = "I could not generate an answer.";

/// Appended to the transcript when a follow-up exchange fails.
pub const CHAT_FAILURE_MESSAGE: &str = "Sorry, there was an error processing your question.";
