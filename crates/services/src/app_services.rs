use std::sync::Arc;

use exam_core::model::Exam;
use storage::repository::Storage;
use storage::result_store::ResultStore;
use storage::session_store::{InMemorySessionStore, KeyValueStore};

use crate::Clock;
use crate::config::ExamSettings;
use crate::error::AppServicesError;
use crate::results::ResultsService;
use crate::sessions::ExamSessionService;

/// Assembles app-facing services over one content backend and one result store.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    sessions: Arc<ExamSessionService>,
    results: Arc<ResultsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` content and an in-memory result store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: ExamSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            storage,
            Arc::new(InMemorySessionStore::new()),
            clock,
            settings,
        ))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, settings: ExamSettings) -> Self {
        Self::from_storage(
            Storage::in_memory(),
            Arc::new(InMemorySessionStore::new()),
            clock,
            settings,
        )
    }

    /// Wire services over explicit backends. Sessions and results share the
    /// same key-value store so a submitted result is visible to the results view.
    #[must_use]
    pub fn from_storage(
        storage: Storage,
        store: Arc<dyn KeyValueStore>,
        clock: Clock,
        settings: ExamSettings,
    ) -> Self {
        let result_store = ResultStore::new(store);
        let results = Arc::new(ResultsService::new(
            clock,
            &settings,
            Arc::clone(&storage.exams),
            Arc::clone(&storage.questions),
            result_store.clone(),
        ));
        let sessions = Arc::new(ExamSessionService::new(
            clock,
            settings,
            Arc::clone(&storage.exams),
            Arc::clone(&storage.questions),
            result_store,
        ));

        Self {
            storage,
            sessions,
            results,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<ExamSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }

    /// Active exams, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the listing fails.
    pub async fn active_exams(&self, limit: u32) -> Result<Vec<Exam>, AppServicesError> {
        let exams = self.storage.exams.list_exams(limit).await?;
        Ok(exams.into_iter().filter(Exam::is_active).collect())
    }
}
