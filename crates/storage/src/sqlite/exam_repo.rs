use exam_core::model::{Exam, ExamId};

use super::SqliteRepository;
use super::mapping::{exam_id_to_i64, map_exam_row};
use crate::repository::{ExamRepository, StorageError};

#[async_trait::async_trait]
impl ExamRepository for SqliteRepository {
    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO exams (id, kind, title, description, duration_minutes, total_marks, is_premium, is_active, starts_at, reveal_results_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                title = excluded.title,
                description = excluded.description,
                duration_minutes = excluded.duration_minutes,
                total_marks = excluded.total_marks,
                is_premium = excluded.is_premium,
                is_active = excluded.is_active,
                starts_at = excluded.starts_at,
                reveal_results_at = excluded.reveal_results_at
            ",
        )
        .bind(exam_id_to_i64(exam.id())?)
        .bind(exam.kind().as_str())
        .bind(exam.title())
        .bind(exam.description())
        .bind(i64::from(exam.duration_minutes()))
        .bind(exam.total_marks())
        .bind(i64::from(exam.is_premium()))
        .bind(i64::from(exam.is_active()))
        .bind(exam.starts_at())
        .bind(exam.reveal_results_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_exam(&self, id: ExamId) -> Result<Option<Exam>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, kind, title, description, duration_minutes, total_marks, is_premium, is_active, starts_at, reveal_results_at
            FROM exams WHERE id = ?1
            ",
        )
        .bind(exam_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_exam_row).transpose()
    }

    async fn list_exams(&self, limit: u32) -> Result<Vec<Exam>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, kind, title, description, duration_minutes, total_marks, is_premium, is_active, starts_at, reveal_results_at
            FROM exams
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_exam_row).collect()
    }
}
