use thiserror::Error;

use crate::model::{BankError, QuestionValidationError, ScoreSummaryError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionValidationError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Summary(#[from] ScoreSummaryError),
}
