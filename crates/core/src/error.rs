use thiserror::Error;

use crate::model::{AnswerError, AnswerKeyError, ExamError, QuestionError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Exam(#[from] ExamError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    AnswerKey(#[from] AnswerKeyError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
}
