//! Markdown rendering of a finished analysis. Pure: no business rules, only
//! layout of what the model returned.
//!
//! Sections: comparative table → selected candidate → other candidates.

use crate::analysis::models::{AnalysisResult, Candidate};

const NO_LANGUAGES_CELL: &str = "-";
const NO_LANGUAGES_DETECTED: &str = "None detected";
const NO_LANGUAGES_MENTIONED: &str = "Not mentioned.";
const NO_UNIQUE_ATTRIBUTES: &str = "No exclusive attributes detected.";

pub fn render_markdown(result: &AnalysisResult) -> String {
    let mut md = String::from("# Evaluation Results\n\n");
    md.push_str(&format!(
        "{} profile(s) analysed.\n\n",
        result.candidates.len()
    ));

    render_table(&mut md, result);
    render_selection(&mut md, result);
    render_others(&mut md, result);

    md
}

fn render_table(md: &mut String, result: &AnalysisResult) {
    md.push_str("## 1. Comparative Talent Table\n\n");
    md.push_str(
        "| Candidate | Experience | Knowledge | Skills | Seniority | Languages | Language Detail | Others | Total | Status |\n",
    );
    md.push_str("|---|---|---|---|---|---|---|---|---|---|\n");

    for c in &result.candidates {
        let status = if c.id == result.best_candidate_id {
            "SELECTED"
        } else {
            "EVALUATED"
        };
        md.push_str(&format!(
            "| ({}) {} | {} yrs | {} | {} | {} | {} | {} | {} | **{}** | {} |\n",
            c.initials(),
            cell(&c.full_name()),
            c.experience_years,
            c.scores.knowledge,
            c.scores.skills,
            c.scores.seniority,
            c.scores.languages,
            cell(c.languages_detail().unwrap_or(NO_LANGUAGES_CELL)),
            c.scores.others,
            c.scores.total,
            status,
        ));
    }
    md.push('\n');
}

fn render_selection(md: &mut String, result: &AnalysisResult) {
    md.push_str("## 2. Selection and Professional Justification\n\n");

    let Some(best) = result.best_candidate() else {
        md.push_str(&format!(
            "_No selected candidate matches id `{}`._\n\n",
            result.best_candidate_id
        ));
        return;
    };

    md.push_str(&format!("### Selected candidate: {}\n\n", best.full_name()));
    md.push_str(&format!("> {}\n\n", result.overall_recommendation.trim()));
    md.push_str(&format!("**Professional profile:** {}\n\n", best.summary.trim()));
    md.push_str(&format!(
        "**Languages:** {}\n\n",
        best.languages_detail().unwrap_or(NO_LANGUAGES_DETECTED)
    ));
    if let Some(unique) = best.unique_attributes() {
        md.push_str(&format!(
            "**Differentiating attributes (exclusive):** _{unique}_\n\n"
        ));
    }
    md.push_str(&format!(
        "**Additional notes:** {}\n\n",
        best.recommendation_reason.trim()
    ));
}

fn render_others(md: &mut String, result: &AnalysisResult) {
    let others: Vec<&Candidate> = result.other_candidates().collect();
    if others.is_empty() {
        return;
    }

    md.push_str("## Other candidates\n\n");
    for c in others {
        md.push_str(&format!("### {} ({}/100)\n\n", c.full_name(), c.scores.total));
        md.push_str(&format!(
            "- Differentiator: _{}_\n",
            c.unique_attributes().unwrap_or(NO_UNIQUE_ATTRIBUTES)
        ));
        md.push_str(&format!(
            "- Languages: {}\n\n",
            c.languages_detail().unwrap_or(NO_LANGUAGES_MENTIONED)
        ));
    }
}

/// Keeps free text from breaking the table layout.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
