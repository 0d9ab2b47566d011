use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Every generated question offers exactly this many choices.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
    pub hint: String,
}

impl Question {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer_index
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub correct: u32,
    pub wrong: u32,
}

impl Score {
    pub fn answered(&self) -> u32 {
        self.correct + self.wrong
    }

    pub fn correct_pct(&self) -> f64 {
        let total = self.answered();
        if total == 0 {
            0.0
        } else {
            (self.correct as f64) * 100.0 / (total as f64)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub issue: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            issue: issue.into(),
        }
    }
}

pub fn validate_question(q: &Question) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if q.question.trim().is_empty() {
        issues.push(ValidationIssue::new("question", "must not be empty"));
    }
    if q.options.len() != OPTION_COUNT {
        issues.push(ValidationIssue::new(
            "options",
            format!("must contain exactly {OPTION_COUNT} options, got {}", q.options.len()),
        ));
    }

    let mut seen = HashSet::new();
    for (i, opt) in q.options.iter().enumerate() {
        let normalized = opt.trim().to_lowercase();
        if normalized.is_empty() {
            issues.push(ValidationIssue::new(format!("options[{i}]"), "must not be empty"));
            continue;
        }
        if !seen.insert(normalized) {
            issues.push(ValidationIssue::new(format!("options[{i}]"), "must be unique"));
        }
    }

    if q.correct_answer_index >= q.options.len() {
        issues.push(ValidationIssue::new(
            "correctAnswerIndex",
            "must reference an existing option",
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
pub(crate) fn sample_question(n: usize) -> Question {
    Question {
        question: format!("Choose the correct form ({n})"),
        options: vec!["go".into(), "goes".into(), "went".into(), "gone".into()],
        correct_answer_index: n % OPTION_COUNT,
        explanation: "Third person singular takes -s.".into(),
        hint: "Look at the subject.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_question_ok() {
        assert!(validate_question(&sample_question(1)).is_ok());
    }

    #[test]
    fn validate_question_negative() {
        let mut q = sample_question(0);
        q.options = vec!["a".into(), "A ".into(), "".into()];
        q.correct_answer_index = 3;
        let issues = validate_question(&q).err().unwrap();
        assert!(issues.iter().any(|i| i.field == "options" && i.issue.contains("exactly 4")));
        assert!(issues.iter().any(|i| i.issue.contains("unique")));
        assert!(issues.iter().any(|i| i.field == "options[2]"));
        assert!(issues.iter().any(|i| i.field == "correctAnswerIndex"));
    }

    #[test]
    fn question_uses_provider_field_names() {
        let raw = serde_json::json!({
            "question": "She ___ to school.",
            "options": ["go", "goes", "going", "gone"],
            "correctAnswerIndex": 1,
            "explanation": "Singular subject.",
            "hint": "Who is she?"
        });
        let q: Question = serde_json::from_value(raw).unwrap();
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
    }

    #[test]
    fn score_pct() {
        let s = Score { correct: 3, wrong: 1 };
        assert_eq!(s.correct_pct(), 75.0);
        assert_eq!(Score::default().correct_pct(), 0.0);
    }
}
