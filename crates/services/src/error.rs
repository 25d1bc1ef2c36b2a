//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{AnswerError, ExamId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::SessionPhase;

/// Errors emitted by the exam session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("exam {0} was not found or has no questions")]
    NotFound(ExamId),
    #[error("operation not allowed while session is {0}")]
    InvalidState(SessionPhase),
    #[error("exam already submitted")]
    AlreadySubmitted,
    #[error("session closed before submission")]
    Abandoned,
    #[error(transparent)]
    Answer(#[from] AnswerError),
}

/// Errors emitted by `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsError {
    #[error("no stored result for exam {0}")]
    MissingResult(ExamId),
    #[error("exam {0} was not found")]
    ExamNotFound(ExamId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Invalid value in the exam settings environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
