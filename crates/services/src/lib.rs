#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod results;
pub mod sessions;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use config::ExamSettings;
pub use error::{AppServicesError, ConfigError, ResultsError, SessionError};
pub use results::{
    McqResultView, QuestionReview, ResultSummary, ResultsService, ReviewStatus, WrittenResultView,
};

pub use sessions::{
    ExamSession, ExamSessionService, ResultRoute, SessionAction, SessionPhase, SessionProgress,
    SessionUpdate, SubmitOutcome, SubmitStep, SubmitTrigger,
};
