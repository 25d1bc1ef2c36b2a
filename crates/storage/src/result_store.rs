use std::sync::Arc;

use exam_core::model::{ExamId, ExamKind, ExamResult, McqResult, WrittenResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::StorageError;
use crate::session_store::KeyValueStore;

/// Key under which a submitted result is kept for the results view.
#[must_use]
pub fn result_key(kind: ExamKind, exam_id: ExamId) -> String {
    match kind {
        ExamKind::Mcq => format!("exam_result_{exam_id}"),
        ExamKind::Written => format!("written_exam_result_{exam_id}"),
    }
}

/// JSON view over a session store for exam results.
#[derive(Clone)]
pub struct ResultStore {
    store: Arc<dyn KeyValueStore>,
}

impl ResultStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write a result under its kind-specific key, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails, or the store's
    /// write error.
    pub fn save(&self, result: &ExamResult) -> Result<(), StorageError> {
        let key = result_key(result.kind(), result.exam_id());
        let json = match result {
            ExamResult::Mcq(r) => encode(r)?,
            ExamResult::Written(r) => encode(r)?,
        };
        self.store.set(&key, json)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the entry is not a
    /// valid MCQ result.
    pub fn load_mcq(&self, exam_id: ExamId) -> Result<Option<McqResult>, StorageError> {
        self.load(&result_key(ExamKind::Mcq, exam_id))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the entry is not a
    /// valid written result.
    pub fn load_written(&self, exam_id: ExamId) -> Result<Option<WrittenResult>, StorageError> {
        self.load(&result_key(ExamKind::Written, exam_id))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    pub fn discard(&self, kind: ExamKind, exam_id: ExamId) -> Result<(), StorageError> {
        self.store.remove(&result_key(kind, exam_id))
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.store
            .get(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_store::InMemorySessionStore;
    use exam_core::model::{EvaluationStatus, ImageRef, QuestionId};
    use exam_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn mcq_result(exam_id: u64) -> McqResult {
        let mut answers = BTreeMap::new();
        answers.insert(QuestionId::new(1), Some(2));
        answers.insert(QuestionId::new(2), None);
        McqResult {
            exam_id: ExamId::new(exam_id),
            correct_count: 1,
            wrong_count: 0,
            skipped_count: 1,
            total_mark: 1.0,
            answers,
            submitted_at: fixed_now(),
        }
    }

    #[test]
    fn keys_follow_kind() {
        assert_eq!(result_key(ExamKind::Mcq, ExamId::new(7)), "exam_result_7");
        assert_eq!(
            result_key(ExamKind::Written, ExamId::new(7)),
            "written_exam_result_7"
        );
    }

    #[test]
    fn mcq_result_survives_the_store() {
        let backing = InMemorySessionStore::new();
        let results = ResultStore::new(Arc::new(backing.clone()));
        let result = mcq_result(3);

        results.save(&ExamResult::Mcq(result.clone())).unwrap();

        assert!(backing.get("exam_result_3").unwrap().is_some());
        assert_eq!(results.load_mcq(ExamId::new(3)).unwrap(), Some(result));
        assert_eq!(results.load_written(ExamId::new(3)).unwrap(), None);
    }

    #[test]
    fn written_result_is_stored_under_written_key() {
        let backing = InMemorySessionStore::new();
        let results = ResultStore::new(Arc::new(backing.clone()));
        let mut submissions = BTreeMap::new();
        submissions.insert(
            QuestionId::new(3),
            vec![ImageRef::from_persisted("blob:local/a")],
        );
        let result = WrittenResult {
            exam_id: ExamId::new(5),
            submissions,
            evaluation_status: EvaluationStatus::Pending,
            submitted_at: fixed_now(),
        };

        results.save(&ExamResult::Written(result.clone())).unwrap();

        let raw = backing.get("written_exam_result_5").unwrap().unwrap();
        assert!(raw.contains("\"evaluation_status\":\"pending\""));
        assert_eq!(results.load_written(ExamId::new(5)).unwrap(), Some(result));
    }

    #[test]
    fn corrupt_entry_is_a_serialization_error() {
        let backing = InMemorySessionStore::new();
        backing.set("exam_result_1", "{not json".into()).unwrap();
        let results = ResultStore::new(Arc::new(backing));

        let err = results.load_mcq(ExamId::new(1)).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn discard_removes_entry() {
        let results = ResultStore::new(Arc::new(InMemorySessionStore::new()));
        results.save(&ExamResult::Mcq(mcq_result(1))).unwrap();
        results.discard(ExamKind::Mcq, ExamId::new(1)).unwrap();
        assert_eq!(results.load_mcq(ExamId::new(1)).unwrap(), None);
    }
}
