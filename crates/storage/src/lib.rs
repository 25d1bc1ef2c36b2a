#![forbid(unsafe_code)]

pub mod repository;
pub mod result_store;
pub mod session_store;
pub mod sqlite;

pub use repository::{ExamRepository, QuestionRepository, Storage, StorageError};
pub use result_store::{ResultStore, result_key};
pub use session_store::{DisabledSessionStore, InMemorySessionStore, KeyValueStore};
