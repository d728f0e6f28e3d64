use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Inclusive upper bound of every sub-score.
pub const MAX_SUB_SCORE: f64 = 20.0;
/// Inclusive upper bound of the total (five sub-scores).
pub const MAX_TOTAL_SCORE: f64 = 100.0;

/// Five sub-scores in [0, 20] plus their expected sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub knowledge: f64,
    pub skills: f64,
    pub seniority: f64,
    /// Must be 0 when the résumé carries no language information.
    pub languages: f64,
    pub others: f64,
    pub total: f64,
}

impl ScoreSet {
    pub fn components(&self) -> [(&'static str, f64); 5] {
        [
            ("knowledge", self.knowledge),
            ("skills", self.skills),
            ("seniority", self.seniority),
            ("languages", self.languages),
            ("others", self.others),
        ]
    }

    pub fn component_sum(&self) -> f64 {
        self.components().iter().map(|(_, v)| v).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub experience_years: f64,
    pub scores: ScoreSet,
    pub summary: String,
    pub recommendation_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_attributes: Option<String>,
    /// Empty when the résumé mentions no languages, but always present.
    pub languages_detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }

    pub fn initials(&self) -> String {
        self.name
            .chars()
            .next()
            .into_iter()
            .chain(self.surname.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Non-blank unique-attributes paragraph, if any.
    pub fn unique_attributes(&self) -> Option<&str> {
        non_blank(self.unique_attributes.as_deref())
    }

    /// Non-blank language detail, if any.
    pub fn languages_detail(&self) -> Option<&str> {
        non_blank(Some(self.languages_detail.as_str()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Outcome of one evaluation run. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Display order as returned by the model.
    pub candidates: Vec<Candidate>,
    pub best_candidate_id: String,
    pub overall_recommendation: String,
}

impl AnalysisResult {
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|c| c.id == self.best_candidate_id)
    }

    pub fn other_candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates
            .iter()
            .filter(move |c| c.id != self.best_candidate_id)
    }

    /// Structural checks the model is asked to honour but that nothing
    /// enforces on its side.
    pub fn check(&self) -> Vec<ResultIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for candidate in &self.candidates {
            if !seen.insert(candidate.id.as_str()) {
                issues.push(ResultIssue::DuplicateCandidateId(candidate.id.clone()));
            }

            if !candidate.experience_years.is_finite() || candidate.experience_years < 0.0 {
                issues.push(ResultIssue::NegativeExperience {
                    candidate_id: candidate.id.clone(),
                    value: candidate.experience_years,
                });
            }

            for (field, value) in candidate.scores.components() {
                if !(0.0..=MAX_SUB_SCORE).contains(&value) {
                    issues.push(ResultIssue::SubScoreOutOfRange {
                        candidate_id: candidate.id.clone(),
                        field,
                        value,
                    });
                }
            }

            let total = candidate.scores.total;
            if !(0.0..=MAX_TOTAL_SCORE).contains(&total) {
                issues.push(ResultIssue::TotalOutOfRange {
                    candidate_id: candidate.id.clone(),
                    value: total,
                });
            }

            let sum = candidate.scores.component_sum();
            if (candidate.scores.total - sum).abs() > 1e-6 {
                issues.push(ResultIssue::TotalMismatch {
                    candidate_id: candidate.id.clone(),
                    total: candidate.scores.total,
                    sum,
                });
            }
        }

        let matches = self
            .candidates
            .iter()
            .filter(|c| c.id == self.best_candidate_id)
            .count();
        if matches == 0 {
            issues.push(ResultIssue::UnknownBestCandidate(
                self.best_candidate_id.clone(),
            ));
        }

        issues
    }
}

/// A deviation from the declared result contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultIssue {
    DuplicateCandidateId(String),
    UnknownBestCandidate(String),
    SubScoreOutOfRange {
        candidate_id: String,
        field: &'static str,
        value: f64,
    },
    NegativeExperience {
        candidate_id: String,
        value: f64,
    },
    TotalOutOfRange {
        candidate_id: String,
        value: f64,
    },
    TotalMismatch {
        candidate_id: String,
        total: f64,
        sum: f64,
    },
}

impl ResultIssue {
    /// Issues that make the result structurally unusable.
    /// A total that disagrees with its components is still displayable.
    pub fn is_structural(&self) -> bool {
        !matches!(self, ResultIssue::TotalMismatch { .. })
    }
}

impl std::fmt::Display for ResultIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultIssue::DuplicateCandidateId(id) => write!(f, "duplicate candidate id '{id}'"),
            ResultIssue::UnknownBestCandidate(id) => {
                write!(f, "bestCandidateId '{id}' matches no candidate")
            }
            ResultIssue::SubScoreOutOfRange {
                candidate_id,
                field,
                value,
            } => write!(
                f,
                "candidate '{candidate_id}' has {field} score {value} outside [0, {MAX_SUB_SCORE}]"
            ),
            ResultIssue::NegativeExperience {
                candidate_id,
                value,
            } => write!(
                f,
                "candidate '{candidate_id}' has invalid experienceYears {value}"
            ),
            ResultIssue::TotalOutOfRange {
                candidate_id,
                value,
            } => write!(
                f,
                "candidate '{candidate_id}' has total {value} outside [0, {MAX_TOTAL_SCORE}]"
            ),
            ResultIssue::TotalMismatch {
                candidate_id,
                total,
                sum,
            } => write!(
                f,
                "candidate '{candidate_id}' total {total} does not equal sub-score sum {sum}"
            ),
        }
    }
}
