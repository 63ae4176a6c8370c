mod answer;
mod bank;
mod question;
mod summary;

pub use answer::AnswerRecord;
pub use bank::{BankError, QuestionBank};
pub use question::{Question, QuestionDraft, QuestionValidationError};
pub use summary::{ScoreSummary, ScoreSummaryError};
