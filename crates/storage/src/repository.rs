use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quiz_core::model::{AnswerRecord, Question, QuestionDraft, QuestionValidationError};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for one working-set question.
///
/// This mirrors the domain `Question` so the snapshot can serialize without
/// leaking storage concerns into the domain layer. Rehydration goes back
/// through draft validation, so a tampered record cannot produce an invalid
/// `Question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer: String,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            prompt: question.prompt().to_owned(),
            choices: question.choices().to_vec(),
            answer: question.answer().to_owned(),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError` if the record no longer satisfies
    /// the bank entry rules.
    pub fn into_question(self) -> Result<Question, QuestionValidationError> {
        QuestionDraft {
            prompt: self.prompt,
            choices: self.choices,
            answer: self.answer,
        }
        .validate()
    }
}

/// Full-state snapshot of a quiz session, the unit of persistence.
///
/// The working set is stored verbatim; re-deriving it from the bank on load
/// would lose a shuffle or a filtered subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub subject: String,
    pub shuffle_questions: bool,
    pub questions: Vec<QuestionRecord>,
    pub position: usize,
    pub answers: BTreeMap<usize, AnswerRecord>,
    pub flagged: BTreeSet<usize>,
    pub choice_orders: BTreeMap<usize, Vec<String>>,
    pub started_at: DateTime<Utc>,
}

/// Repository contract for the single persisted session slot.
///
/// Writes are last-write-wins full-state snapshots; there is exactly one
/// logical key per store.
#[async_trait]
pub trait SessionStateRepository: Send + Sync {
    /// Persist the snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;

    /// Fetch the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a corrupt snapshot, or
    /// other storage errors. A missing snapshot is `Ok(None)`.
    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Remove the stored snapshot. Removing an absent snapshot is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn clear_snapshot(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshot: Arc<Mutex<Option<SessionSnapshot>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl SessionStateRepository for InMemoryRepository {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}
