use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in the bank document.
///
/// The external format uses the key `question` for the prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(rename = "question")]
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer: String,
}

impl QuestionDraft {
    /// Check the draft against the bank entry rules and produce a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError` if the prompt is blank, there are
    /// fewer than two choices, a choice is blank or duplicated, or the
    /// answer is not one of the choices.
    pub fn validate(self) -> Result<Question, QuestionValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionValidationError::EmptyPrompt);
        }
        if self.choices.len() < 2 {
            return Err(QuestionValidationError::TooFewChoices {
                len: self.choices.len(),
            });
        }
        for (i, choice) in self.choices.iter().enumerate() {
            if choice.trim().is_empty() {
                return Err(QuestionValidationError::EmptyChoice { index: i });
            }
            if self.choices[..i].contains(choice) {
                return Err(QuestionValidationError::DuplicateChoice {
                    choice: choice.clone(),
                });
            }
        }
        if !self.choices.contains(&self.answer) {
            return Err(QuestionValidationError::AnswerNotInChoices {
                answer: self.answer,
            });
        }

        Ok(Question {
            prompt: self.prompt,
            choices: self.choices,
            answer: self.answer,
        })
    }
}

/// A validated multiple-choice question.
///
/// Immutable once built; the answer is guaranteed to be one of the choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    choices: Vec<String>,
    answer: String,
}

impl Question {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// The authoritative answer. Correctness is judged against this value
    /// only, never against a display order or index.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Exact value equality against the answer field.
    #[must_use]
    pub fn is_correct(&self, choice: &str) -> bool {
        self.answer == choice
    }

    /// Whether `choice` is one of this question's choices.
    #[must_use]
    pub fn has_choice(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }
}

//
// ─── VALIDATION ERRORS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("too few choices: {len}")]
    TooFewChoices { len: usize },

    #[error("choice {index} is empty")]
    EmptyChoice { index: usize },

    #[error("duplicate choice: {choice}")]
    DuplicateChoice { choice: String },

    #[error("answer is not one of the choices: {answer}")]
    AnswerNotInChoices { answer: String },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(prompt: &str, choices: &[&str], answer: &str) -> QuestionDraft {
        QuestionDraft {
            prompt: prompt.to_string(),
            choices: choices.iter().map(ToString::to_string).collect(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn valid_draft_builds_question() {
        let q = draft("2 + 2?", &["3", "4"], "4").validate().unwrap();
        assert_eq!(q.prompt(), "2 + 2?");
        assert_eq!(q.choices().len(), 2);
        assert!(q.is_correct("4"));
        assert!(!q.is_correct("3"));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = draft("   ", &["a", "b"], "a").validate().unwrap_err();
        assert_eq!(err, QuestionValidationError::EmptyPrompt);
    }

    #[test]
    fn single_choice_is_rejected() {
        let err = draft("Q", &["a"], "a").validate().unwrap_err();
        assert!(matches!(err, QuestionValidationError::TooFewChoices { len: 1 }));
    }

    #[test]
    fn blank_choice_is_rejected() {
        let err = draft("Q", &["a", " "], "a").validate().unwrap_err();
        assert!(matches!(err, QuestionValidationError::EmptyChoice { index: 1 }));
    }

    #[test]
    fn duplicate_choice_is_rejected() {
        let err = draft("Q", &["a", "b", "a"], "a").validate().unwrap_err();
        assert!(matches!(err, QuestionValidationError::DuplicateChoice { .. }));
    }

    #[test]
    fn answer_outside_choices_is_rejected() {
        let err = draft("Q", &["a", "b"], "c").validate().unwrap_err();
        assert!(matches!(
            err,
            QuestionValidationError::AnswerNotInChoices { .. }
        ));
    }

    #[test]
    fn correctness_is_exact_equality() {
        let q = draft("Q", &["Paris", "paris"], "Paris").validate().unwrap();
        assert!(q.is_correct("Paris"));
        assert!(!q.is_correct("paris"));
        assert!(!q.is_correct("Paris "));
    }

    #[test]
    fn draft_deserializes_external_key_names() {
        let q: QuestionDraft =
            serde_json::from_str(r#"{"question":"Q","choices":["a","b"],"answer":"b"}"#).unwrap();
        assert_eq!(q.prompt, "Q");
        assert_eq!(q.answer, "b");
    }
}
