use async_trait::async_trait;
use exam_core::model::{Exam, ExamId, Question};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to exams. The session controller only reads.
#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// Persist or update an exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the exam cannot be stored.
    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError>;

    /// Fetch an exam by ID. Missing exams are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn get_exam(&self, id: ExamId) -> Result<Option<Exam>, StorageError>;

    /// List exams ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn list_exams(&self, limit: u32) -> Result<Vec<Exam>, StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or replace a question at the given position within an exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the exam does not exist, or other
    /// storage errors.
    async fn upsert_question(
        &self,
        exam_id: ExamId,
        position: u32,
        question: &Question,
    ) -> Result<(), StorageError>;

    /// Fetch an exam's questions in position order. Empty when none exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a row cannot be decoded.
    async fn get_questions(&self, exam_id: ExamId) -> Result<Vec<Question>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    exams: Arc<Mutex<HashMap<ExamId, Exam>>>,
    questions: Arc<Mutex<HashMap<ExamId, Vec<(u32, Question)>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamRepository for InMemoryRepository {
    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError> {
        let mut guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(exam.id(), exam.clone());
        Ok(())
    }

    async fn get_exam(&self, id: ExamId) -> Result<Option<Exam>, StorageError> {
        let guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_exams(&self, limit: u32) -> Result<Vec<Exam>, StorageError> {
        let guard = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut exams: Vec<Exam> = guard.values().cloned().collect();
        exams.sort_by_key(Exam::id);
        exams.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(exams)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(
        &self,
        exam_id: ExamId,
        position: u32,
        question: &Question,
    ) -> Result<(), StorageError> {
        let known = self
            .exams
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .contains_key(&exam_id);
        if !known {
            return Err(StorageError::NotFound);
        }

        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let entries = guard.entry(exam_id).or_default();
        entries.retain(|(_, q)| q.id() != question.id());
        entries.push((position, question.clone()));
        entries.sort_by_key(|(pos, q)| (*pos, q.id()));
        Ok(())
    }

    async fn get_questions(&self, exam_id: ExamId) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&exam_id)
            .map(|entries| entries.iter().map(|(_, q)| q.clone()).collect())
            .unwrap_or_default())
    }
}

/// Aggregates exam and question repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub exams: Arc<dyn ExamRepository>,
    pub questions: Arc<dyn QuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let exams: Arc<dyn ExamRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Self { exams, questions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        CorrectAnswer, ExamDraft, ExamKind, McqQuestion, QuestionId, WrittenQuestion,
    };
    use exam_core::time::fixed_now;

    fn build_exam(id: u64) -> Exam {
        ExamDraft {
            id: ExamId::new(id),
            kind: ExamKind::Mcq,
            title: format!("Exam {id}"),
            description: None,
            duration_minutes: 20,
            total_marks: 10.0,
            is_premium: false,
            is_active: true,
            starts_at: fixed_now(),
            reveal_results_at: None,
        }
        .validate()
        .unwrap()
    }

    fn mcq(id: u64) -> Question {
        Question::Mcq(
            McqQuestion::new(
                QuestionId::new(id),
                format!("Q{id}"),
                vec!["x".into(), "y".into()],
                &CorrectAnswer::Key("B".into()),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn questions_come_back_in_position_order() {
        let repo = InMemoryRepository::new();
        let exam = build_exam(1);
        repo.upsert_exam(&exam).await.unwrap();

        repo.upsert_question(exam.id(), 2, &mcq(20)).await.unwrap();
        repo.upsert_question(exam.id(), 1, &mcq(10)).await.unwrap();
        repo.upsert_question(exam.id(), 3, &mcq(30)).await.unwrap();

        let ids: Vec<u64> = repo
            .get_questions(exam.id())
            .await
            .unwrap()
            .iter()
            .map(|q| q.id().value())
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn upsert_question_replaces_same_id() {
        let repo = InMemoryRepository::new();
        let exam = build_exam(1);
        repo.upsert_exam(&exam).await.unwrap();

        repo.upsert_question(exam.id(), 1, &mcq(5)).await.unwrap();
        let written = Question::Written(
            WrittenQuestion::new(QuestionId::new(5), "Now written", 3.0).unwrap(),
        );
        repo.upsert_question(exam.id(), 1, &written).await.unwrap();

        let questions = repo.get_questions(exam.id()).await.unwrap();
        assert_eq!(questions, vec![written]);
    }

    #[tokio::test]
    async fn missing_exam_is_none_and_rejects_questions() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_exam(ExamId::new(9)).await.unwrap().is_none());
        assert!(repo.get_questions(ExamId::new(9)).await.unwrap().is_empty());

        let err = repo
            .upsert_question(ExamId::new(9), 1, &mcq(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
