mod progress;
mod service;
mod view;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use progress::QuizProgress;
pub use service::{
    PendingAdvance, QuizSession, SessionRestoreError, SubmitOutcome, auto_advance_delay,
};
pub use view::{PositionMark, QuestionView};
pub use workflow::QuizRunnerService;
