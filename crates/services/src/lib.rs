#![forbid(unsafe_code)]

pub mod bank_service;
pub mod error;
pub mod quiz;

pub use quiz_core::Clock;

pub use bank_service::BankLoader;
pub use error::{BankLoadError, QuizError};
pub use quiz::{
    PendingAdvance, PositionMark, QuestionView, QuizProgress, QuizRunnerService, QuizSession,
    SessionRestoreError, SubmitOutcome, auto_advance_delay,
};
