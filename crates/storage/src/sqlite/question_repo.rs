use exam_core::model::{ExamId, Question};

use super::SqliteRepository;
use super::mapping::{exam_id_to_i64, map_question_row, question_columns, question_id_to_i64};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(
        &self,
        exam_id: ExamId,
        position: u32,
        question: &Question,
    ) -> Result<(), StorageError> {
        let cols = question_columns(question)?;

        let res = sqlx::query(
            r"
            INSERT INTO questions (id, exam_id, position, kind, prompt, options, correct_index, marks)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(exam_id, id) DO UPDATE SET
                position = excluded.position,
                kind = excluded.kind,
                prompt = excluded.prompt,
                options = excluded.options,
                correct_index = excluded.correct_index,
                marks = excluded.marks
            ",
        )
        .bind(question_id_to_i64(question.id())?)
        .bind(exam_id_to_i64(exam_id)?)
        .bind(i64::from(position))
        .bind(cols.kind)
        .bind(question.prompt())
        .bind(cols.options)
        .bind(cols.correct_index)
        .bind(cols.marks)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StorageError::NotFound)
            }
            Err(e) => Err(StorageError::Connection(e.to_string())),
        }
    }

    async fn get_questions(&self, exam_id: ExamId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, kind, prompt, options, correct_index, marks
            FROM questions
            WHERE exam_id = ?1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(exam_id_to_i64(exam_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_question_row).collect()
    }
}
