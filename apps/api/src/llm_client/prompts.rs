// Shared prompt fragments and prompt-building utilities.
// Each service that needs model calls defines its own prompts alongside it.
// This file contains cross-cutting fragments.

/// Instruction that keeps free-text answers inside the supplied data.
pub const GROUNDING_INSTRUCTION: &str = "\
    Be professional and base your answer ONLY on the data provided above. \
    Do NOT use outside knowledge and do NOT invent facts about the candidates. \
    If the data does not contain the answer, say so plainly.";

/// Instruction that keeps structured output machine-readable.
pub const STRICT_JSON_INSTRUCTION: &str = "\
    Return the data strictly in the requested JSON format. \
    Do NOT wrap it in markdown code fences and do NOT add any text outside the JSON object.";

/// Renders the output-language instruction appended to every prompt.
pub fn language_instruction(language: &str) -> String {
    format!("Write ALL free-text content in {language}.")
}
