use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::AnswerRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreSummaryError {
    #[error("finished_at is before started_at")]
    InvalidTimeRange,

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },

    #[error("answered count ({answered}) exceeds total questions ({total})")]
    AnsweredExceedsTotal { answered: u32, total: u32 },

    #[error("correct count ({correct}) exceeds answered count ({answered})")]
    CorrectExceedsAnswered { correct: u32, answered: u32 },
}

/// Final score for a finished quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSummary {
    subject: String,
    total_questions: u32,
    answered_count: u32,
    correct_count: u32,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ScoreSummary {
    /// Rehydrate a summary from persisted counts.
    ///
    /// # Errors
    ///
    /// Returns `ScoreSummaryError` if the time range is inverted or the
    /// counts are impossible.
    pub fn from_persisted(
        subject: impl Into<String>,
        total_questions: u32,
        answered_count: u32,
        correct_count: u32,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<Self, ScoreSummaryError> {
        if finished_at < started_at {
            return Err(ScoreSummaryError::InvalidTimeRange);
        }
        if answered_count > total_questions {
            return Err(ScoreSummaryError::AnsweredExceedsTotal {
                answered: answered_count,
                total: total_questions,
            });
        }
        if correct_count > answered_count {
            return Err(ScoreSummaryError::CorrectExceedsAnswered {
                correct: correct_count,
                answered: answered_count,
            });
        }

        Ok(Self {
            subject: subject.into(),
            total_questions,
            answered_count,
            correct_count,
            started_at,
            finished_at,
        })
    }

    /// Build a summary from a working set size and its answer records.
    ///
    /// # Errors
    ///
    /// Returns `ScoreSummaryError::TooManyQuestions` if the counts cannot
    /// fit in `u32`, or any `from_persisted` error.
    pub fn from_answers(
        subject: impl Into<String>,
        total_questions: usize,
        answers: &BTreeMap<usize, AnswerRecord>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<Self, ScoreSummaryError> {
        let total = u32::try_from(total_questions).map_err(|_| {
            ScoreSummaryError::TooManyQuestions {
                len: total_questions,
            }
        })?;
        let answered = u32::try_from(answers.len()).map_err(|_| {
            ScoreSummaryError::TooManyQuestions { len: answers.len() }
        })?;
        let correct = answers.values().filter(|a| a.is_correct).count();
        let correct =
            u32::try_from(correct).map_err(|_| ScoreSummaryError::TooManyQuestions { len: correct })?;

        Self::from_persisted(subject, total, answered, correct, started_at, finished_at)
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.answered_count
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Score as a percentage of the whole working set, rounded to one
    /// decimal. Defined as 0.0 for an empty working set.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        (f64::from(self.correct_count) * 1000.0 / f64::from(self.total_questions)).round() / 10.0
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
