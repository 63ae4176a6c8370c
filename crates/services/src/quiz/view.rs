use quiz_core::model::AnswerRecord;

use super::service::QuizSession;

/// Presentation-agnostic view of the current question.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no layout or styling assumptions
///
/// The presentation layer decides how to render choices, feedback, and the
/// flag state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub position: usize,
    pub total: usize,
    pub prompt: String,
    /// Choices in their fixed display order.
    pub choices: Vec<String>,
    /// The user's recorded answer for this position, if any.
    pub answer: Option<AnswerRecord>,
    /// The authoritative answer, revealed only once the position is
    /// answered.
    pub correct_answer: Option<String>,
    pub flagged: bool,
}

impl QuestionView {
    /// View of the session's current position, fixing its display order on
    /// first access. `None` on an empty working set.
    #[must_use]
    pub fn of_current(session: &mut QuizSession) -> Option<Self> {
        let choices = session.choices_for_current()?.to_vec();
        let question = session.current_question()?;
        let prompt = question.prompt().to_string();
        let correct_answer = question.answer().to_string();

        let position = session.position();
        let answer = session.answer_at(position).cloned();
        let correct_answer = answer.as_ref().map(|_| correct_answer);

        Some(Self {
            position,
            total: session.total_questions(),
            prompt,
            choices,
            answer,
            correct_answer,
            flagged: session.is_flagged(position),
        })
    }
}

/// Per-position state for a pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionMark {
    /// `Some(is_correct)` once the position is answered.
    pub answered: Option<bool>,
    pub flagged: bool,
}

impl PositionMark {
    /// One mark per working-set position, in order.
    #[must_use]
    pub fn for_session(session: &QuizSession) -> Vec<Self> {
        (0..session.total_questions())
            .map(|position| Self {
                answered: session.answer_at(position).map(|a| a.is_correct),
                flagged: session.is_flagged(position),
            })
            .collect()
    }
}
