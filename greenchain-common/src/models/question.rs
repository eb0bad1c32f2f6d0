//! Quiz questions
//!
//! Two historical encodings exist for the question type: a `type` string
//! (`"multiple-choice"` / `"essay"`) and a legacy `isEssay` boolean. Both are
//! accepted on read and collapse into [`QuestionKind`]; writes always use
//! `type`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    /// Rich-text prompt
    pub prompt: String,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    MultipleChoice(MultipleChoice),
    Essay,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultipleChoice {
    /// Rich-text choices, in display order
    pub options: Vec<String>,
    /// Zero-based index into `options`. None when missing or negative in
    /// stored data.
    pub correct_answer: Option<usize>,
    /// Fallback rationale shown after answering
    pub explanation: String,
    /// Optional per-option rationale aligned with `options`
    pub option_explanations: Vec<String>,
}

impl Question {
    pub fn essay(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Essay,
        }
    }

    pub fn multiple_choice(prompt: impl Into<String>, choice: MultipleChoice) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::MultipleChoice(choice),
        }
    }

    pub fn is_essay(&self) -> bool {
        matches!(self.kind, QuestionKind::Essay)
    }

    /// Whether `selected` is the correct option. Always false for essays.
    pub fn is_correct(&self, selected: usize) -> bool {
        match &self.kind {
            QuestionKind::MultipleChoice(mc) => mc.correct_answer == Some(selected),
            QuestionKind::Essay => false,
        }
    }

    /// Rationale displayed after choosing option `selected`
    ///
    /// A non-blank `option_explanations[selected]` overrides the general
    /// explanation. Essays have no explanation.
    pub fn explanation_for(&self, selected: usize) -> Option<&str> {
        match &self.kind {
            QuestionKind::MultipleChoice(mc) => {
                let specific = mc
                    .option_explanations
                    .get(selected)
                    .filter(|text| !text.trim().is_empty());
                Some(specific.unwrap_or(&mc.explanation).as_str())
            }
            QuestionKind::Essay => None,
        }
    }

    /// Enforce `0 <= correct_answer < options.len()` for multiple choice
    pub fn validate(&self) -> Result<()> {
        if let QuestionKind::MultipleChoice(mc) = &self.kind {
            if mc.options.is_empty() {
                return Err(Error::InvalidInput(
                    "multiple-choice question has no options".to_string(),
                ));
            }
            match mc.correct_answer {
                Some(index) if index < mc.options.len() => {}
                Some(index) => {
                    return Err(Error::InvalidInput(format!(
                        "correctAnswer {} out of range for {} options",
                        index,
                        mc.options.len()
                    )))
                }
                None => {
                    return Err(Error::InvalidInput(
                        "multiple-choice question has no correctAnswer".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// On-disk / on-wire shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    #[serde(default)]
    question: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing)]
    is_essay: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_answer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    option_explanations: Option<Vec<String>>,
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        let essay = record.kind.as_deref() == Some("essay") || record.is_essay == Some(true);
        if essay {
            return Question::essay(record.question);
        }

        Question::multiple_choice(
            record.question,
            MultipleChoice {
                options: record.options,
                correct_answer: record.correct_answer.and_then(|v| usize::try_from(v).ok()),
                explanation: record.explanation.unwrap_or_default(),
                option_explanations: record.option_explanations.unwrap_or_default(),
            },
        )
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        match question.kind {
            QuestionKind::Essay => QuestionRecord {
                question: question.prompt,
                kind: Some("essay".to_string()),
                ..Default::default()
            },
            QuestionKind::MultipleChoice(mc) => QuestionRecord {
                question: question.prompt,
                kind: Some("multiple-choice".to_string()),
                is_essay: None,
                options: mc.options,
                correct_answer: mc.correct_answer.map(|v| v as i64),
                explanation: Some(mc.explanation).filter(|e| !e.is_empty()),
                option_explanations: Some(mc.option_explanations).filter(|o| !o.is_empty()),
            },
        }
    }
}
