use serde::{Deserialize, Serialize};

/// Outcome recorded for one answered position.
///
/// Once recorded it never changes for that position until the session is
/// reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub selected: String,
    pub is_correct: bool,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(selected: impl Into<String>, is_correct: bool) -> Self {
        Self {
            selected: selected.into(),
            is_correct,
        }
    }
}
