use std::sync::Arc;

use chrono::{DateTime, Utc};

use quiz_core::Clock;
use quiz_core::model::{QuestionBank, ScoreSummary};
use storage::repository::{SessionStateRepository, StorageError};

use super::service::{QuizSession, SubmitOutcome};
use crate::error::QuizError;

/// Orchestrates quiz intents against the bank and the session store.
///
/// Every intent persists a fresh full-state snapshot, so a restart resumes
/// where the user left off; `finish` removes the snapshot instead.
#[derive(Clone)]
pub struct QuizRunnerService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    store: Arc<dyn SessionStateRepository>,
}

impl QuizRunnerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        store: Arc<dyn SessionStateRepository>,
    ) -> Self {
        Self { clock, bank, store }
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Subject names available for selection, in listing order.
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        self.bank.subjects().collect()
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Start a fresh session for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownSubject` if the bank has no such subject,
    /// or `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn start_subject(
        &self,
        subject: &str,
        shuffle: bool,
    ) -> Result<QuizSession, QuizError> {
        let questions = self
            .bank
            .questions_for(subject)
            .ok_or_else(|| QuizError::UnknownSubject {
                subject: subject.to_string(),
            })?
            .to_vec();

        let session = QuizSession::start(subject, questions, shuffle, self.clock.now());
        self.persist(&session).await?;
        Ok(session)
    }

    /// Load the persisted session, if a usable one exists.
    ///
    /// A missing snapshot, an undeserializable one, and one that violates
    /// the session invariants all yield `Ok(None)`: the quiz starts fresh
    /// rather than failing.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` only for infrastructure failures such
    /// as a lost connection.
    pub async fn restore(&self) -> Result<Option<QuizSession>, QuizError> {
        let snapshot = match self.store.load_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(%reason, "discarding corrupt session snapshot");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let Some(snapshot) = snapshot else {
            return Ok(None);
        };

        match QuizSession::from_snapshot(snapshot) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                tracing::warn!(error = %err, "discarding invalid session snapshot");
                Ok(None)
            }
        }
    }

    /// Record an answer for the session's current position.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        choice: &str,
    ) -> Result<SubmitOutcome, QuizError> {
        let outcome = session.submit_answer(choice, self.clock.now());
        self.persist(session).await?;
        Ok(outcome)
    }

    /// Wait out the session's pending advance and apply it if still valid.
    /// Returns true when the position advanced.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn auto_advance(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let Some(pending) = session.pending_advance() else {
            return Ok(false);
        };

        if let Ok(wait) = (pending.due_at() - self.clock.now()).to_std() {
            tokio::time::sleep(wait).await;
        }

        let fired = session.fire_auto_advance(self.clock.now().max(pending.due_at()));
        if fired {
            self.persist(session).await?;
        }
        Ok(fired)
    }

    /// Jump to `index`; out-of-range intents are ignored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn go_to(&self, session: &mut QuizSession, index: usize) -> Result<bool, QuizError> {
        let moved = session.go_to(index);
        self.persist(session).await?;
        Ok(moved)
    }

    /// Advance one position; a no-op at the last index.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn next(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let moved = session.next();
        self.persist(session).await?;
        Ok(moved)
    }

    /// Retreat one position; a no-op at index 0.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn prev(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let moved = session.prev();
        self.persist(session).await?;
        Ok(moved)
    }

    /// Flip the review flag on the current position.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn toggle_flag(&self, session: &mut QuizSession) -> Result<Option<bool>, QuizError> {
        let flagged = session.toggle_flag();
        self.persist(session).await?;
        Ok(flagged)
    }

    /// Restart the session over the positions answered incorrectly.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn retry_wrong(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        session.retry_wrong();
        self.persist(session).await
    }

    /// Restart the session over the flagged positions, keeping prior
    /// answers.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn review_flagged(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        session.review_flagged();
        self.persist(session).await
    }

    /// Change the session's shuffle preference; applied when the full set
    /// is next rebuilt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the snapshot cannot be persisted.
    pub async fn set_shuffle_preference(
        &self,
        session: &mut QuizSession,
        shuffle: bool,
    ) -> Result<(), QuizError> {
        session.set_shuffle_preference(shuffle);
        self.persist(session).await
    }

    /// Rebuild the full working set for the session's subject, reusing its
    /// shuffle preference.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownSubject` if the subject has vanished from
    /// the bank, or `QuizError::Storage` if the snapshot cannot be
    /// persisted.
    pub async fn back_to_full(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        let subject = session.subject().to_string();
        let questions = self
            .bank
            .questions_for(&subject)
            .ok_or(QuizError::UnknownSubject { subject })?
            .to_vec();

        let shuffle = session.shuffle_questions();
        session.restart_with(questions, shuffle, self.clock.now());
        self.persist(session).await
    }

    /// Finish the session: compute the score and remove the persisted
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Summary` for an inverted time range and
    /// `QuizError::Storage` if the snapshot cannot be removed.
    pub async fn finish(&self, session: &mut QuizSession) -> Result<ScoreSummary, QuizError> {
        let summary = session.finish(self.clock.now())?;
        self.store.clear_snapshot().await?;
        Ok(summary)
    }

    async fn persist(&self, session: &QuizSession) -> Result<(), QuizError> {
        self.store.save_snapshot(&session.to_snapshot()).await?;
        Ok(())
    }
}
