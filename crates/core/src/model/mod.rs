mod answer;
mod exam;
mod ids;
mod question;
mod result;

pub use answer::{Answer, AnswerError, AnswerSheet, ImageFile, ImageRef, UploadedImage};
pub use exam::{Exam, ExamDraft, ExamError, ExamKind};
pub use ids::{ExamId, ParseIdError, QuestionId};
pub use question::{
    AnswerKeyError, CorrectAnswer, McqQuestion, Question, QuestionError, QuestionKind,
    WrittenQuestion, normalize_answer_key,
};
pub use result::{EvaluationStatus, ExamResult, McqResult, WrittenResult};
