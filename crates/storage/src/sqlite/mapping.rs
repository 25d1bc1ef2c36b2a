use exam_core::model::{
    CorrectAnswer, Exam, ExamDraft, ExamId, ExamKind, McqQuestion, Question, QuestionId,
    WrittenQuestion,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn exam_id_to_i64(id: ExamId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("exam_id overflow".into()))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn parse_exam_kind(s: &str) -> Result<ExamKind, StorageError> {
    match s {
        "mcq" => Ok(ExamKind::Mcq),
        "written" => Ok(ExamKind::Written),
        _ => Err(StorageError::Serialization(format!("invalid exam kind: {s}"))),
    }
}

pub(crate) fn map_exam_row(row: &SqliteRow) -> Result<Exam, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    let duration: i64 = row.try_get("duration_minutes").map_err(ser)?;

    ExamDraft {
        id: ExamId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?),
        kind: parse_exam_kind(&kind)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        duration_minutes: u32::try_from(duration)
            .map_err(|_| StorageError::Serialization(format!("invalid duration: {duration}")))?,
        total_marks: row.try_get("total_marks").map_err(ser)?,
        is_premium: row.try_get::<i64, _>("is_premium").map_err(ser)? != 0,
        is_active: row.try_get::<i64, _>("is_active").map_err(ser)? != 0,
        starts_at: row.try_get("starts_at").map_err(ser)?,
        reveal_results_at: row.try_get("reveal_results_at").map_err(ser)?,
    }
    .validate()
    .map_err(ser)
}

/// Column values for one question row, derived from the domain variant.
pub(crate) struct QuestionColumns {
    pub kind: &'static str,
    pub options: Option<String>,
    pub correct_index: Option<i64>,
    pub marks: Option<f64>,
}

pub(crate) fn question_columns(question: &Question) -> Result<QuestionColumns, StorageError> {
    match question {
        Question::Mcq(q) => Ok(QuestionColumns {
            kind: "mcq",
            options: Some(serde_json::to_string(q.options()).map_err(ser)?),
            correct_index: Some(
                i64::try_from(q.correct_index())
                    .map_err(|_| StorageError::Serialization("correct_index overflow".into()))?,
            ),
            marks: None,
        }),
        Question::Written(q) => Ok(QuestionColumns {
            kind: "written",
            options: None,
            correct_index: None,
            marks: Some(q.marks()),
        }),
    }
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = QuestionId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let kind: String = row.try_get("kind").map_err(ser)?;

    match kind.as_str() {
        "mcq" => {
            let raw_options: Option<String> = row.try_get("options").map_err(ser)?;
            let options: Vec<String> = serde_json::from_str(
                raw_options
                    .as_deref()
                    .ok_or_else(|| StorageError::Serialization("missing options".into()))?,
            )
            .map_err(ser)?;
            let correct: i64 = row
                .try_get::<Option<i64>, _>("correct_index")
                .map_err(ser)?
                .ok_or_else(|| StorageError::Serialization("missing correct_index".into()))?;
            let correct = usize::try_from(correct).map_err(|_| {
                StorageError::Serialization(format!("invalid correct_index: {correct}"))
            })?;

            McqQuestion::new(id, prompt, options, &CorrectAnswer::Index(correct))
                .map(Question::Mcq)
                .map_err(ser)
        }
        "written" => {
            let marks: f64 = row
                .try_get::<Option<f64>, _>("marks")
                .map_err(ser)?
                .ok_or_else(|| StorageError::Serialization("missing marks".into()))?;
            WrittenQuestion::new(id, prompt, marks)
                .map(Question::Written)
                .map_err(ser)
        }
        other => Err(StorageError::Serialization(format!(
            "invalid question kind: {other}"
        ))),
    }
}
