//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{BankError, ScoreSummaryError};
use storage::repository::StorageError;

/// Errors emitted by `BankLoader`.
///
/// All of these are fatal to starting a quiz: the bank is loaded once and
/// there is no automatic retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("bank request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("failed to read bank resource: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed bank document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] BankError),
}

/// Errors emitted by `QuizRunnerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("unknown subject: {subject}")]
    UnknownSubject { subject: String },
    #[error(transparent)]
    Summary(#[from] ScoreSummaryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
