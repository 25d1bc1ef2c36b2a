use std::sync::Arc;

use exam_core::model::{Exam, ExamId, ExamResult, Question};
use storage::repository::{ExamRepository, QuestionRepository, StorageError};
use storage::result_store::ResultStore;

use super::controller::ExamSession;
use super::state::{ResultRoute, SessionPhase, SubmitGate, SubmitTrigger, Submission};
use super::timer::CountdownTimer;
use crate::Clock;
use crate::config::ExamSettings;
use crate::error::SessionError;

/// Result of a finished submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub route: ResultRoute,
    pub result: ExamResult,
    pub trigger: SubmitTrigger,
    /// `false` when the result store rejected the write.
    pub persisted: bool,
}

/// What a submit request led to.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStep {
    NeedsConfirmation { unanswered: usize },
    Submitted(SubmitOutcome),
}

/// Loads exam sessions and carries submissions through to the result store.
#[derive(Clone)]
pub struct ExamSessionService {
    clock: Clock,
    settings: ExamSettings,
    exams: Arc<dyn ExamRepository>,
    questions: Arc<dyn QuestionRepository>,
    results: ResultStore,
}

impl ExamSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: ExamSettings,
        exams: Arc<dyn ExamRepository>,
        questions: Arc<dyn QuestionRepository>,
        results: ResultStore,
    ) -> Self {
        Self {
            clock,
            settings,
            exams,
            questions,
            results,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    /// Load exam content and resolve a session.
    ///
    /// Provider failures are logged and resolve to `NotFound` like a missing
    /// exam; they are not retried.
    pub async fn load(&self, exam_id: ExamId) -> ExamSession {
        let mut session = ExamSession::loading(exam_id, &self.settings);
        let (exam, questions) = match self.fetch(exam_id).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(%exam_id, error = %err, "failed to load exam content");
                (None, Vec::new())
            }
        };
        // A fresh session is always `Loading`.
        if let Err(err) = session.resolve(exam, questions) {
            tracing::error!(%exam_id, error = %err, "could not resolve new session");
        }
        session
    }

    async fn fetch(
        &self,
        exam_id: ExamId,
    ) -> Result<(Option<Exam>, Vec<Question>), StorageError> {
        let Some(exam) = self.exams.get_exam(exam_id).await? else {
            return Ok((None, Vec::new()));
        };
        let questions = self.questions.get_questions(exam_id).await?;
        Ok((Some(exam), questions))
    }

    /// Start the countdown for an in-progress session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session accepts answers.
    pub fn start_timer(&self, session: &ExamSession) -> Result<CountdownTimer, SessionError> {
        if !session.phase().accepts_answers() {
            return Err(SessionError::InvalidState(session.phase()));
        }
        let Some(exam) = session.exam() else {
            return Err(SessionError::NotFound(session.exam_id()));
        };
        tracing::debug!(
            exam_id = %session.exam_id(),
            duration_secs = exam.duration_secs(),
            "starting countdown"
        );
        Ok(CountdownTimer::start(exam.duration_secs(), self.settings.tick()))
    }

    /// Request submission; unanswered questions stop at the confirmation gate.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot be submitted.
    pub fn request_submit(&self, session: &mut ExamSession) -> Result<SubmitStep, SessionError> {
        match session.request_submit(self.clock.now())? {
            SubmitGate::NeedsConfirmation { unanswered } => {
                Ok(SubmitStep::NeedsConfirmation { unanswered })
            }
            SubmitGate::Ready(submission) => {
                self.finish(session, submission).map(SubmitStep::Submitted)
            }
        }
    }

    /// Submit after the user confirmed unanswered questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if no confirmation is pending or the exam was
    /// already submitted.
    pub fn confirm_submit(&self, session: &mut ExamSession) -> Result<SubmitOutcome, SessionError> {
        let submission = session.confirm_submit(self.clock.now())?;
        self.finish(session, submission)
    }

    /// Handle countdown expiry. `None` when a submission already happened.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session never started.
    pub fn time_up(&self, session: &mut ExamSession) -> Result<Option<SubmitOutcome>, SessionError> {
        match session.on_time_up(self.clock.now())? {
            Some(submission) => self.finish(session, submission).map(Some),
            None => {
                tracing::debug!(exam_id = %session.exam_id(), "time up after submission ignored");
                Ok(None)
            }
        }
    }

    fn finish(
        &self,
        session: &mut ExamSession,
        submission: Submission,
    ) -> Result<SubmitOutcome, SessionError> {
        debug_assert_eq!(session.phase(), SessionPhase::Submitting);
        let persisted = match self.results.save(&submission.result) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    exam_id = %submission.exam_id,
                    error = %err,
                    "result could not be stored, keeping it in memory"
                );
                false
            }
        };
        let route = session.complete(persisted)?;
        tracing::info!(exam_id = %submission.exam_id, %route, persisted, "exam session completed");

        Ok(SubmitOutcome {
            route,
            result: submission.result,
            trigger: submission.trigger,
            persisted,
        })
    }
}
