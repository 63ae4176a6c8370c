#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuestionRecord, SessionSnapshot, SessionStateRepository, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
