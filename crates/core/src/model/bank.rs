use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Question, QuestionDraft, QuestionValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("invalid question {index} in subject {subject:?}: {source}")]
    InvalidQuestion {
        subject: String,
        index: usize,
        source: QuestionValidationError,
    },
}

/// Read-only bank of questions grouped by subject.
///
/// Built once at load time; every entry has passed validation, so a
/// malformed question can never surface later as a silent wrong-answer bug.
/// Subjects are kept in sorted order so listings are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionBank {
    subjects: BTreeMap<String, Vec<Question>>,
}

impl QuestionBank {
    /// Validate drafts per subject and assemble the bank.
    ///
    /// # Errors
    ///
    /// Returns `BankError::InvalidQuestion` naming the subject and index of
    /// the first entry that fails validation.
    pub fn from_drafts(
        drafts: impl IntoIterator<Item = (String, Vec<QuestionDraft>)>,
    ) -> Result<Self, BankError> {
        let mut subjects = BTreeMap::new();
        for (subject, entries) in drafts {
            let mut questions = Vec::with_capacity(entries.len());
            for (index, draft) in entries.into_iter().enumerate() {
                let question =
                    draft
                        .validate()
                        .map_err(|source| BankError::InvalidQuestion {
                            subject: subject.clone(),
                            index,
                            source,
                        })?;
                questions.push(question);
            }
            subjects.insert(subject, questions);
        }
        Ok(Self { subjects })
    }

    /// Subject names in sorted order.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.contains_key(subject)
    }

    /// The bank's ordered questions for `subject`, if it exists.
    #[must_use]
    pub fn questions_for(&self, subject: &str) -> Option<&[Question]> {
        self.subjects.get(subject).map(Vec::as_slice)
    }

    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(prompt: &str, answer: &str) -> QuestionDraft {
        QuestionDraft {
            prompt: prompt.to_string(),
            choices: vec![answer.to_string(), format!("not {answer}")],
            answer: answer.to_string(),
        }
    }

    #[test]
    fn bank_keeps_question_order_within_subject() {
        let bank = QuestionBank::from_drafts(vec![(
            "Math".to_string(),
            vec![draft("Q1", "a"), draft("Q2", "b")],
        )])
        .unwrap();

        let questions = bank.questions_for("Math").unwrap();
        assert_eq!(questions[0].prompt(), "Q1");
        assert_eq!(questions[1].prompt(), "Q2");
    }

    #[test]
    fn bank_lists_subjects_sorted() {
        let bank = QuestionBank::from_drafts(vec![
            ("Physics".to_string(), vec![draft("Q", "a")]),
            ("Biology".to_string(), vec![draft("Q", "a")]),
        ])
        .unwrap();

        let subjects: Vec<_> = bank.subjects().collect();
        assert_eq!(subjects, vec!["Biology", "Physics"]);
        assert!(bank.contains("Physics"));
        assert!(!bank.contains("Chemistry"));
    }

    #[test]
    fn invalid_entry_reports_subject_and_index() {
        let bad = QuestionDraft {
            prompt: "Q".to_string(),
            choices: vec!["a".to_string(), "b".to_string()],
            answer: "c".to_string(),
        };
        let err = QuestionBank::from_drafts(vec![(
            "Math".to_string(),
            vec![draft("Q1", "a"), bad],
        )])
        .unwrap_err();

        assert!(matches!(
            err,
            BankError::InvalidQuestion { ref subject, index: 1, .. } if subject == "Math"
        ));
    }

    #[test]
    fn unknown_subject_yields_none() {
        let bank = QuestionBank::from_drafts(Vec::new()).unwrap();
        assert!(bank.questions_for("Math").is_none());
        assert!(bank.is_empty());
    }
}
