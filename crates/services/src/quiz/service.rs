use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use quiz_core::model::{
    AnswerRecord, Question, QuestionValidationError, ScoreSummary, ScoreSummaryError,
};
use storage::repository::{QuestionRecord, SessionSnapshot};

use super::progress::QuizProgress;

const AUTO_ADVANCE_DELAY_MS: i64 = 800;

/// Delay between a correct answer and the scheduled advance to the next
/// position.
#[must_use]
pub fn auto_advance_delay() -> Duration {
    Duration::milliseconds(AUTO_ADVANCE_DELAY_MS)
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// A scheduled advance to the next position, pending until it is due.
///
/// It stays bound to the position it was scheduled from; if the user moves
/// before it fires it is stale and must be discarded, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    from_position: usize,
    due_at: DateTime<Utc>,
}

impl PendingAdvance {
    #[must_use]
    pub fn from_position(&self) -> usize {
        self.from_position
    }

    #[must_use]
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }
}

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The answer was recorded; `auto_advance_at` is set when a correct
    /// answer scheduled an advance.
    Recorded {
        is_correct: bool,
        auto_advance_at: Option<DateTime<Utc>>,
    },
    /// Stale intent: the position was already answered, the working set is
    /// empty, the session is finished, or the choice does not belong to
    /// the question. Ignored without error.
    Ignored,
}

impl SubmitOutcome {
    #[must_use]
    pub fn was_recorded(&self) -> bool {
        matches!(self, SubmitOutcome::Recorded { .. })
    }
}

//
// ─── RESTORE ERRORS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionRestoreError {
    #[error("position {position} out of range for {len} questions")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("answer recorded for unknown position {position}")]
    AnswerOutOfRange { position: usize },

    #[error("recorded selection is not a choice of question {position}")]
    SelectionNotInChoices { position: usize },

    #[error("recorded correctness disagrees with question {position}")]
    CorrectnessMismatch { position: usize },

    #[error("choice order stored for unknown position {position}")]
    ChoiceOrderOutOfRange { position: usize },

    #[error("choice order for position {position} is not a permutation of the question's choices")]
    ChoiceOrderMismatch { position: usize },

    #[error("flag on unknown position {position}")]
    FlagOutOfRange { position: usize },

    #[error(transparent)]
    Question(#[from] QuestionValidationError),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// The quiz session state machine.
///
/// Owns the working set (a copy, never the bank's backing storage), the
/// current position, per-position answer and flag records, and the fixed
/// display order of each question's choices. Every per-position record is
/// keyed by an index into the working set. A position moves from
/// unanswered to answered exactly once; only a session reset clears it.
pub struct QuizSession {
    subject: String,
    questions: Vec<Question>,
    position: usize,
    answers: BTreeMap<usize, AnswerRecord>,
    flagged: BTreeSet<usize>,
    choice_orders: BTreeMap<usize, Vec<String>>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    shuffle_questions: bool,
    pending_advance: Option<PendingAdvance>,
    rng: StdRng,
}

impl QuizSession {
    /// Start a session over a fresh working set.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    #[must_use]
    pub fn start(
        subject: impl Into<String>,
        questions: Vec<Question>,
        shuffle: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self::start_with_rng(subject, questions, shuffle, started_at, StdRng::from_os_rng())
    }

    /// Like [`QuizSession::start`], with a caller-provided RNG so shuffles
    /// are reproducible.
    #[must_use]
    pub fn start_with_rng(
        subject: impl Into<String>,
        mut questions: Vec<Question>,
        shuffle: bool,
        started_at: DateTime<Utc>,
        mut rng: StdRng,
    ) -> Self {
        if shuffle {
            questions.shuffle(&mut rng);
        }

        Self {
            subject: subject.into(),
            questions,
            position: 0,
            answers: BTreeMap::new(),
            flagged: BTreeSet::new(),
            choice_orders: BTreeMap::new(),
            started_at,
            finished_at: None,
            shuffle_questions: shuffle,
            pending_advance: None,
            rng,
        }
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The working set currently being quizzed.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// The shuffle preference the next full restart will use.
    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    /// Change the shuffle preference. The current working set keeps its
    /// order; the preference applies when the full set is next rebuilt.
    pub fn set_shuffle_preference(&mut self, shuffle: bool) {
        self.shuffle_questions = shuffle;
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, AnswerRecord> {
        &self.answers
    }

    #[must_use]
    pub fn answer_at(&self, position: usize) -> Option<&AnswerRecord> {
        self.answers.get(&position)
    }

    #[must_use]
    pub fn is_answered(&self, position: usize) -> bool {
        self.answers.contains_key(&position)
    }

    #[must_use]
    pub fn flagged(&self) -> &BTreeSet<usize> {
        &self.flagged
    }

    #[must_use]
    pub fn is_flagged(&self, position: usize) -> bool {
        self.flagged.contains(&position)
    }

    /// `None` on an empty working set; the presentation layer has nothing
    /// to show then.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    #[must_use]
    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.pending_advance
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.questions.len();
        let answered = self.answers.len();
        let correct = self.answers.values().filter(|a| a.is_correct).count();
        QuizProgress {
            total,
            answered,
            correct,
            wrong: answered - correct,
            flagged: self.flagged.len(),
            remaining: total - answered,
            is_complete: answered == total,
        }
    }

    //
    // ─── DISPLAY ORDER ─────────────────────────────────────────────────────
    //

    /// Display order for the current question's choices.
    ///
    /// Generated by shuffling a copy on first access and fixed thereafter,
    /// so re-displaying the same position yields the same order for the
    /// lifetime of the position within the session.
    pub fn choices_for_current(&mut self) -> Option<&[String]> {
        if self.questions.is_empty() {
            return None;
        }
        if !self.choice_orders.contains_key(&self.position) {
            let mut order = self.questions[self.position].choices().to_vec();
            order.shuffle(&mut self.rng);
            self.choice_orders.insert(self.position, order);
        }
        self.choice_orders.get(&self.position).map(Vec::as_slice)
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────
    //

    /// Record an answer for the current position.
    ///
    /// Answers are single-shot: a position that already holds a record is
    /// left untouched and the intent reports `Ignored`. Correctness is
    /// judged by exact value equality against the question's answer field.
    /// A correct answer anywhere but the last position schedules a pending
    /// advance due after [`auto_advance_delay`]; incorrect answers never
    /// auto-advance.
    pub fn submit_answer(&mut self, choice: &str, now: DateTime<Utc>) -> SubmitOutcome {
        if self.is_finished() || self.questions.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.answers.contains_key(&self.position) {
            return SubmitOutcome::Ignored;
        }
        let question = &self.questions[self.position];
        if !question.has_choice(choice) {
            return SubmitOutcome::Ignored;
        }

        let is_correct = question.is_correct(choice);
        self.answers
            .insert(self.position, AnswerRecord::new(choice, is_correct));

        let auto_advance_at = if is_correct && self.position + 1 < self.questions.len() {
            let due_at = now + auto_advance_delay();
            self.pending_advance = Some(PendingAdvance {
                from_position: self.position,
                due_at,
            });
            Some(due_at)
        } else {
            None
        };

        SubmitOutcome::Recorded {
            is_correct,
            auto_advance_at,
        }
    }

    /// Apply the pending advance if it is due and still valid.
    ///
    /// A pending advance whose origin position no longer matches the
    /// current one is stale and is discarded without moving the user.
    /// Returns true when the position advanced.
    pub fn fire_auto_advance(&mut self, now: DateTime<Utc>) -> bool {
        let Some(pending) = self.pending_advance else {
            return false;
        };
        if pending.from_position != self.position {
            tracing::debug!(
                scheduled_from = pending.from_position,
                position = self.position,
                "discarding stale auto-advance"
            );
            self.pending_advance = None;
            return false;
        }
        if now < pending.due_at {
            return false;
        }

        self.pending_advance = None;
        if self.position + 1 < self.questions.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────
    //

    /// Jump to `index`. An out-of-range index is a stale-UI intent and is
    /// ignored. Returns true when the position changed; any change cancels
    /// a pending advance.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.questions.len() || index == self.position {
            return false;
        }
        self.position = index;
        self.pending_advance = None;
        true
    }

    /// Advance one position; a no-op at the last index.
    pub fn next(&mut self) -> bool {
        if self.position + 1 >= self.questions.len() {
            return false;
        }
        self.position += 1;
        self.pending_advance = None;
        true
    }

    /// Retreat one position; a no-op at index 0.
    pub fn prev(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        self.pending_advance = None;
        true
    }

    /// Flip the review flag on the current position. Returns the new flag
    /// state, or `None` on an empty working set.
    pub fn toggle_flag(&mut self) -> Option<bool> {
        if self.questions.is_empty() {
            return None;
        }
        if self.flagged.remove(&self.position) {
            Some(false)
        } else {
            self.flagged.insert(self.position);
            Some(true)
        }
    }

    //
    // ─── RESETS ────────────────────────────────────────────────────────────
    //

    /// Rebuild the working set from the positions answered incorrectly, in
    /// order. Positions never answered are excluded. All per-position
    /// state resets; subject, shuffle preference, and start time carry
    /// over.
    pub fn retry_wrong(&mut self) {
        let wrong: Vec<Question> = self
            .answers
            .iter()
            .filter(|(_, record)| !record.is_correct)
            .map(|(&position, _)| self.questions[position].clone())
            .collect();
        self.questions = wrong;
        self.reset_positions();
    }

    /// Rebuild the working set from the flagged positions, in order.
    ///
    /// Prior answer records are preserved and remapped to the new indices
    /// so the review shows earlier correctness. Every kept question stays
    /// flagged until toggled off. Choice orders are regenerated.
    pub fn review_flagged(&mut self) {
        let kept: Vec<usize> = self.flagged.iter().copied().collect();
        let questions: Vec<Question> = kept
            .iter()
            .map(|&position| self.questions[position].clone())
            .collect();

        let mut answers = BTreeMap::new();
        for (new_position, &old_position) in kept.iter().enumerate() {
            if let Some(record) = self.answers.remove(&old_position) {
                answers.insert(new_position, record);
            }
        }

        self.questions = questions;
        self.answers = answers;
        self.flagged = (0..self.questions.len()).collect();
        self.choice_orders.clear();
        self.position = 0;
        self.pending_advance = None;
        self.finished_at = None;
    }

    /// Replace the working set and reset every per-position record; used
    /// for subject restarts.
    pub(crate) fn restart_with(
        &mut self,
        mut questions: Vec<Question>,
        shuffle: bool,
        now: DateTime<Utc>,
    ) {
        if shuffle {
            questions.shuffle(&mut self.rng);
        }
        self.questions = questions;
        self.shuffle_questions = shuffle;
        self.reset_positions();
        self.started_at = now;
    }

    fn reset_positions(&mut self) {
        self.position = 0;
        self.answers.clear();
        self.flagged.clear();
        self.choice_orders.clear();
        self.pending_advance = None;
        self.finished_at = None;
    }

    //
    // ─── FINISH ────────────────────────────────────────────────────────────
    //

    /// Mark the session finished and compute the score. Idempotent: a
    /// second call reuses the recorded finish time.
    ///
    /// # Errors
    ///
    /// Returns `ScoreSummaryError` if `now` precedes the session start.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<ScoreSummary, ScoreSummaryError> {
        let finished_at = *self.finished_at.get_or_insert(now);
        self.pending_advance = None;
        ScoreSummary::from_answers(
            self.subject.clone(),
            self.questions.len(),
            &self.answers,
            self.started_at,
            finished_at,
        )
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────
    //

    /// Full-state snapshot, the unit of persistence.
    #[must_use]
    pub fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            subject: self.subject.clone(),
            shuffle_questions: self.shuffle_questions,
            questions: self
                .questions
                .iter()
                .map(QuestionRecord::from_question)
                .collect(),
            position: self.position,
            answers: self.answers.clone(),
            flagged: self.flagged.clone(),
            choice_orders: self.choice_orders.clone(),
            started_at: self.started_at,
        }
    }

    /// Rebuild a session from a persisted snapshot, enforcing the session
    /// invariants.
    ///
    /// # Errors
    ///
    /// Returns `SessionRestoreError` if a question record fails
    /// validation, the position is out of range, an answer or flag or
    /// choice order references an unknown position, a recorded selection
    /// is not one of its question's choices, or a stored choice order is
    /// not a permutation of the question's choices.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Result<Self, SessionRestoreError> {
        let questions = snapshot
            .questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        let len = questions.len();

        if snapshot.position != 0 && snapshot.position >= len {
            return Err(SessionRestoreError::PositionOutOfRange {
                position: snapshot.position,
                len,
            });
        }

        for (&position, record) in &snapshot.answers {
            let question = questions
                .get(position)
                .ok_or(SessionRestoreError::AnswerOutOfRange { position })?;
            if !question.has_choice(&record.selected) {
                return Err(SessionRestoreError::SelectionNotInChoices { position });
            }
            if record.is_correct != question.is_correct(&record.selected) {
                return Err(SessionRestoreError::CorrectnessMismatch { position });
            }
        }

        for (&position, order) in &snapshot.choice_orders {
            let question = questions
                .get(position)
                .ok_or(SessionRestoreError::ChoiceOrderOutOfRange { position })?;
            let choices = question.choices();
            let is_permutation =
                order.len() == choices.len() && choices.iter().all(|c| order.contains(c));
            if !is_permutation {
                return Err(SessionRestoreError::ChoiceOrderMismatch { position });
            }
        }

        if let Some(&position) = snapshot.flagged.iter().find(|&&p| p >= len) {
            return Err(SessionRestoreError::FlagOutOfRange { position });
        }

        Ok(Self {
            subject: snapshot.subject,
            questions,
            position: snapshot.position,
            answers: snapshot.answers,
            flagged: snapshot.flagged,
            choice_orders: snapshot.choice_orders,
            started_at: snapshot.started_at,
            finished_at: None,
            shuffle_questions: snapshot.shuffle_questions,
            pending_advance: None,
            rng: StdRng::from_os_rng(),
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("subject", &self.subject)
            .field("questions_len", &self.questions.len())
            .field("position", &self.position)
            .field("answered_len", &self.answers.len())
            .field("flagged_len", &self.flagged.len())
            .field("started_at", &self.started_at)
            .field("finished_at", &self.finished_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
