use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use exam_core::model::{
    AnswerSheet, Exam, ExamId, ExamKind, ExamResult, ImageFile, McqQuestion, McqResult, Question,
    QuestionId, QuestionKind, UploadedImage, WrittenResult,
};
use exam_core::scoring::{MarkingScheme, score_mcq};

use super::progress::SessionProgress;
use super::state::{ResultRoute, SessionPhase, SubmitGate, SubmitTrigger, Submission};
use crate::config::ExamSettings;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for a single exam attempt.
///
/// `Loading → InProgress → (ConfirmingSubmit) → Submitting → Completed`, with
/// `NotFound` as a terminal alternative to `InProgress`. Submission happens at
/// most once, whether triggered by the user or by the countdown.
pub struct ExamSession {
    exam_id: ExamId,
    phase: SessionPhase,
    exam: Option<Exam>,
    questions: Vec<Question>,
    answers: AnswerSheet,
    marking: MarkingScheme,
    max_images_per_question: Option<usize>,
    time_up_fired: bool,
    submission: Option<Submission>,
    persisted: Option<bool>,
}

impl ExamSession {
    /// A session waiting for its exam content.
    #[must_use]
    pub fn loading(exam_id: ExamId, settings: &ExamSettings) -> Self {
        Self {
            exam_id,
            phase: SessionPhase::Loading,
            exam: None,
            questions: Vec::new(),
            answers: AnswerSheet::default(),
            marking: *settings.marking(),
            max_images_per_question: settings.max_images_per_question(),
            time_up_fired: false,
            submission: None,
            persisted: None,
        }
    }

    /// Apply loaded content.
    ///
    /// Enters `InProgress` when an active exam with at least one question of its
    /// kind is present, otherwise `NotFound`. Questions of the other kind and
    /// repeated ids are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is `Loading`.
    pub fn resolve(
        &mut self,
        exam: Option<Exam>,
        questions: Vec<Question>,
    ) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::InvalidState(self.phase));
        }

        let Some(exam) = exam else {
            tracing::info!(exam_id = %self.exam_id, "exam not found");
            self.phase = SessionPhase::NotFound;
            return Ok(self.phase);
        };
        if !exam.is_active() {
            tracing::info!(exam_id = %self.exam_id, "exam is inactive");
            self.phase = SessionPhase::NotFound;
            return Ok(self.phase);
        }

        let wanted = match exam.kind() {
            ExamKind::Mcq => QuestionKind::Mcq,
            ExamKind::Written => QuestionKind::Written,
        };
        let mut seen = HashSet::new();
        let total_loaded = questions.len();
        let questions: Vec<Question> = questions
            .into_iter()
            .filter(|q| q.kind() == wanted && seen.insert(q.id()))
            .collect();
        if questions.len() != total_loaded {
            tracing::warn!(
                exam_id = %self.exam_id,
                dropped = total_loaded - questions.len(),
                "dropped questions not matching exam kind or duplicated"
            );
        }

        if questions.is_empty() {
            tracing::info!(exam_id = %self.exam_id, "exam has no questions");
            self.phase = SessionPhase::NotFound;
            return Ok(self.phase);
        }

        self.answers = AnswerSheet::for_questions(&questions);
        self.questions = questions;
        self.exam = Some(exam);
        self.phase = SessionPhase::InProgress;
        tracing::debug!(
            exam_id = %self.exam_id,
            questions = self.questions.len(),
            "exam session in progress"
        );
        Ok(self.phase)
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn exam(&self) -> Option<&Exam> {
        self.exam.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    /// `Some(false)` when the result could only be kept in memory.
    #[must_use]
    pub fn persisted(&self) -> Option<bool> {
        self.persisted
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.answers.len(),
            answered: self.answers.answered_count(),
            unanswered: self.answers.unanswered_count(),
            phase: self.phase,
        }
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Select an option for an MCQ question, replacing any previous choice.
    ///
    /// The option index is not bounds-checked against the rendered options.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` outside `InProgress`, or
    /// `SessionError::Answer` for unknown or non-MCQ questions.
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        option: usize,
    ) -> Result<(), SessionError> {
        self.ensure_accepting()?;
        self.answers.select(question_id, option)?;
        self.refresh_confirmation();
        Ok(())
    }

    /// Append images to a written question and return its new image count.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` outside `InProgress`, or
    /// `SessionError::Answer` for unknown or non-written questions or when the
    /// configured per-question cap would be exceeded.
    pub fn upload_images(
        &mut self,
        question_id: QuestionId,
        files: Vec<ImageFile>,
    ) -> Result<usize, SessionError> {
        self.ensure_accepting()?;
        let uploads = files.into_iter().map(UploadedImage::from_file).collect();
        let count = self
            .answers
            .append_images(question_id, uploads, self.max_images_per_question)?;
        self.refresh_confirmation();
        Ok(count)
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Ask to submit. Unanswered questions require an explicit confirmation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission, or
    /// `SessionError::InvalidState` before the exam is in progress.
    pub fn request_submit(&mut self, now: DateTime<Utc>) -> Result<SubmitGate, SessionError> {
        self.ensure_accepting()?;
        let unanswered = self.answers.unanswered_count();
        if unanswered > 0 {
            self.phase = SessionPhase::ConfirmingSubmit { unanswered };
            tracing::debug!(exam_id = %self.exam_id, unanswered, "submit needs confirmation");
            return Ok(SubmitGate::NeedsConfirmation { unanswered });
        }
        self.begin_submit(SubmitTrigger::Manual, now)
            .map(SubmitGate::Ready)
    }

    /// Submit despite unanswered questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission, or
    /// `SessionError::InvalidState` if no confirmation is pending.
    pub fn confirm_submit(&mut self, now: DateTime<Utc>) -> Result<Submission, SessionError> {
        match self.phase {
            SessionPhase::ConfirmingSubmit { .. } => {
                self.begin_submit(SubmitTrigger::Confirmed, now)
            }
            phase if phase.is_submitted() => Err(SessionError::AlreadySubmitted),
            phase => Err(SessionError::InvalidState(phase)),
        }
    }

    /// Return from the confirmation prompt to answering.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if no confirmation is pending.
    pub fn cancel_submit(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::ConfirmingSubmit { .. } => {
                self.phase = SessionPhase::InProgress;
                Ok(())
            }
            phase => Err(SessionError::InvalidState(phase)),
        }
    }

    /// Countdown expiry. Submits unconditionally the first time it is called
    /// while answers are open; every later call, or a call after a manual
    /// submission, is a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the exam never started.
    pub fn on_time_up(&mut self, now: DateTime<Utc>) -> Result<Option<Submission>, SessionError> {
        if self.time_up_fired || self.phase.is_submitted() {
            self.time_up_fired = true;
            return Ok(None);
        }
        if !self.phase.accepts_answers() {
            return Err(SessionError::InvalidState(self.phase));
        }
        self.time_up_fired = true;
        tracing::info!(
            exam_id = %self.exam_id,
            unanswered = self.answers.unanswered_count(),
            "time is up, submitting"
        );
        self.begin_submit(SubmitTrigger::TimeUp, now).map(Some)
    }

    /// Mark the submission as finished and return the results route.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is `Submitting`.
    pub fn complete(&mut self, persisted: bool) -> Result<ResultRoute, SessionError> {
        let route = match (&self.phase, &self.submission) {
            (SessionPhase::Submitting, Some(submission)) => submission.route,
            _ => return Err(SessionError::InvalidState(self.phase)),
        };
        self.phase = SessionPhase::Completed;
        self.persisted = Some(persisted);
        Ok(route)
    }

    fn ensure_accepting(&self) -> Result<(), SessionError> {
        if self.phase.accepts_answers() {
            Ok(())
        } else if self.phase.is_submitted() {
            Err(SessionError::AlreadySubmitted)
        } else {
            Err(SessionError::InvalidState(self.phase))
        }
    }

    fn refresh_confirmation(&mut self) {
        if let SessionPhase::ConfirmingSubmit { .. } = self.phase {
            self.phase = SessionPhase::ConfirmingSubmit {
                unanswered: self.answers.unanswered_count(),
            };
        }
    }

    fn begin_submit(
        &mut self,
        trigger: SubmitTrigger,
        now: DateTime<Utc>,
    ) -> Result<Submission, SessionError> {
        self.ensure_accepting()?;
        let Some(exam) = self.exam.as_ref() else {
            return Err(SessionError::NotFound(self.exam_id));
        };

        let result = match exam.kind() {
            ExamKind::Mcq => {
                let mcqs: Vec<&McqQuestion> =
                    self.questions.iter().filter_map(Question::as_mcq).collect();
                let score = score_mcq(&mcqs, &self.answers, &self.marking, exam.total_marks());
                ExamResult::Mcq(McqResult::new(self.exam_id, score, &self.answers, now))
            }
            ExamKind::Written => {
                ExamResult::Written(WrittenResult::pending(self.exam_id, &self.answers, now))
            }
        };

        let submission = Submission {
            exam_id: self.exam_id,
            route: ResultRoute::for_exam(exam.kind(), self.exam_id),
            result,
            trigger,
        };
        self.phase = SessionPhase::Submitting;
        self.submission = Some(submission.clone());
        tracing::info!(exam_id = %self.exam_id, ?trigger, "exam submitted");
        Ok(submission)
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("exam_id", &self.exam_id)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("answered", &self.answers.answered_count())
            .field("time_up_fired", &self.time_up_fired)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        AnswerError, CorrectAnswer, EvaluationStatus, ExamDraft, WrittenQuestion,
    };
    use exam_core::time::fixed_now;

    fn build_exam(kind: ExamKind, total_marks: f64) -> Exam {
        ExamDraft {
            id: ExamId::new(1),
            kind,
            title: "Mock".into(),
            description: None,
            duration_minutes: 10,
            total_marks,
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
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
                &CorrectAnswer::Key("A".into()),
            )
            .unwrap(),
        )
    }

    fn written(id: u64) -> Question {
        Question::Written(WrittenQuestion::new(QuestionId::new(id), format!("W{id}"), 5.0).unwrap())
    }

    fn mcq_session(n: u64) -> ExamSession {
        let mut session = ExamSession::loading(ExamId::new(1), &ExamSettings::default());
        session
            .resolve(
                Some(build_exam(ExamKind::Mcq, n as f64)),
                (1..=n).map(mcq).collect(),
            )
            .unwrap();
        session
    }

    fn written_session(n: u64) -> ExamSession {
        let mut session = ExamSession::loading(ExamId::new(1), &ExamSettings::default());
        session
            .resolve(
                Some(build_exam(ExamKind::Written, 5.0 * n as f64)),
                (1..=n).map(written).collect(),
            )
            .unwrap();
        session
    }

    #[test]
    fn missing_or_empty_content_is_not_found() {
        let mut session = ExamSession::loading(ExamId::new(1), &ExamSettings::default());
        assert_eq!(
            session.resolve(None, vec![mcq(1)]).unwrap(),
            SessionPhase::NotFound
        );

        let mut session = ExamSession::loading(ExamId::new(1), &ExamSettings::default());
        assert_eq!(
            session
                .resolve(Some(build_exam(ExamKind::Mcq, 1.0)), vec![])
                .unwrap(),
            SessionPhase::NotFound
        );
        assert!(matches!(
            session.request_submit(fixed_now()),
            Err(SessionError::InvalidState(SessionPhase::NotFound))
        ));
        assert!(matches!(
            session.on_time_up(fixed_now()),
            Err(SessionError::InvalidState(SessionPhase::NotFound))
        ));
    }

    #[test]
    fn inactive_exam_is_not_found() {
        let inactive = ExamDraft {
            id: ExamId::new(1),
            kind: ExamKind::Mcq,
            title: "Retired".into(),
            description: None,
            duration_minutes: 10,
            total_marks: 1.0,
            is_premium: false,
            is_active: false,
            starts_at: fixed_now(),
            reveal_results_at: None,
        }
        .validate()
        .unwrap();
        let mut session = ExamSession::loading(ExamId::new(1), &ExamSettings::default());
        assert_eq!(
            session.resolve(Some(inactive), vec![mcq(1)]).unwrap(),
            SessionPhase::NotFound
        );
    }

    #[test]
    fn mismatched_and_duplicate_questions_are_dropped() {
        let mut session = ExamSession::loading(ExamId::new(1), &ExamSettings::default());
        session
            .resolve(
                Some(build_exam(ExamKind::Mcq, 2.0)),
                vec![mcq(1), written(2), mcq(1), mcq(3)],
            )
            .unwrap();
        assert_eq!(session.questions().len(), 2);
        assert_eq!(session.progress().total, 2);
    }

    #[test]
    fn answers_are_rejected_before_loading_and_after_submit() {
        let mut session = ExamSession::loading(ExamId::new(1), &ExamSettings::default());
        assert!(matches!(
            session.select_answer(QuestionId::new(1), 0),
            Err(SessionError::InvalidState(SessionPhase::Loading))
        ));

        let mut session = mcq_session(1);
        session.select_answer(QuestionId::new(1), 0).unwrap();
        session.request_submit(fixed_now()).unwrap();
        assert!(matches!(
            session.select_answer(QuestionId::new(1), 1),
            Err(SessionError::AlreadySubmitted)
        ));
    }

    #[test]
    fn select_answer_is_idempotent() {
        let mut session = mcq_session(3);
        session.select_answer(QuestionId::new(2), 3).unwrap();
        let once = session.answers().clone();
        session.select_answer(QuestionId::new(2), 3).unwrap();
        assert_eq!(session.answers(), &once);
    }

    #[test]
    fn select_answer_on_written_question_is_rejected() {
        let mut session = written_session(2);
        assert!(matches!(
            session.select_answer(QuestionId::new(1), 0),
            Err(SessionError::Answer(AnswerError::WrongVariant { .. }))
        ));
    }

    #[test]
    fn uploads_are_additive() {
        let mut session = written_session(2);
        session
            .upload_images(QuestionId::new(1), vec![ImageFile::new("a.jpg", 10)])
            .unwrap();
        let count = session
            .upload_images(QuestionId::new(1), vec![ImageFile::new("b.jpg", 20)])
            .unwrap();

        assert_eq!(count, 2);
        let names: Vec<&str> = session
            .answers()
            .images(QuestionId::new(1))
            .iter()
            .map(|img| img.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn upload_cap_comes_from_settings() {
        let settings = ExamSettings::default().with_max_images_per_question(Some(1));
        let mut session = ExamSession::loading(ExamId::new(1), &settings);
        session
            .resolve(Some(build_exam(ExamKind::Written, 5.0)), vec![written(1)])
            .unwrap();
        session
            .upload_images(QuestionId::new(1), vec![ImageFile::new("a.jpg", 1)])
            .unwrap();
        assert!(matches!(
            session.upload_images(QuestionId::new(1), vec![ImageFile::new("b.jpg", 1)]),
            Err(SessionError::Answer(AnswerError::TooManyImages { .. }))
        ));
    }

    #[test]
    fn request_submit_with_gaps_needs_confirmation() {
        let mut session = mcq_session(3);
        session.select_answer(QuestionId::new(1), 0).unwrap();

        let gate = session.request_submit(fixed_now()).unwrap();
        assert_eq!(gate, SubmitGate::NeedsConfirmation { unanswered: 2 });
        assert_eq!(
            session.phase(),
            SessionPhase::ConfirmingSubmit { unanswered: 2 }
        );
        assert!(session.submission().is_none());

        session.cancel_submit().unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn repeated_requests_with_gaps_never_submit() {
        let mut session = mcq_session(3);
        for _ in 0..3 {
            assert_eq!(
                session.request_submit(fixed_now()).unwrap(),
                SubmitGate::NeedsConfirmation { unanswered: 3 }
            );
        }
        assert!(session.submission().is_none());
        assert!(session.phase().accepts_answers());
    }

    #[test]
    fn answering_while_confirming_updates_unanswered_count() {
        let mut session = mcq_session(3);
        session.request_submit(fixed_now()).unwrap();
        session.select_answer(QuestionId::new(3), 1).unwrap();
        assert_eq!(
            session.phase(),
            SessionPhase::ConfirmingSubmit { unanswered: 2 }
        );
    }

    #[test]
    fn confirmed_submit_happens_exactly_once() {
        let mut session = mcq_session(2);
        session.request_submit(fixed_now()).unwrap();

        let submission = session.confirm_submit(fixed_now()).unwrap();
        assert_eq!(submission.trigger, SubmitTrigger::Confirmed);
        assert!(matches!(
            session.confirm_submit(fixed_now()),
            Err(SessionError::AlreadySubmitted)
        ));
        assert!(matches!(
            session.request_submit(fixed_now()),
            Err(SessionError::AlreadySubmitted)
        ));
    }

    #[test]
    fn fully_answered_request_submits_directly() {
        let mut session = mcq_session(2);
        session.select_answer(QuestionId::new(1), 0).unwrap();
        session.select_answer(QuestionId::new(2), 1).unwrap();

        let SubmitGate::Ready(submission) = session.request_submit(fixed_now()).unwrap() else {
            panic!("expected direct submission");
        };
        assert_eq!(submission.trigger, SubmitTrigger::Manual);
        assert_eq!(session.phase(), SessionPhase::Submitting);

        let ExamResult::Mcq(result) = submission.result else {
            panic!("expected MCQ result");
        };
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.wrong_count, 1);
        assert!((result.total_mark - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn time_up_bypasses_confirmation_and_fires_once() {
        let mut session = mcq_session(4);
        session.request_submit(fixed_now()).unwrap();

        let submission = session.on_time_up(fixed_now()).unwrap().expect("submitted");
        assert_eq!(submission.trigger, SubmitTrigger::TimeUp);
        let ExamResult::Mcq(result) = &submission.result else {
            panic!("expected MCQ result");
        };
        assert_eq!(result.skipped_count, 4);

        assert_eq!(session.on_time_up(fixed_now()).unwrap(), None);
    }

    #[test]
    fn time_up_after_manual_submit_is_ignored() {
        let mut session = mcq_session(1);
        session.select_answer(QuestionId::new(1), 0).unwrap();
        session.request_submit(fixed_now()).unwrap();
        assert_eq!(session.on_time_up(fixed_now()).unwrap(), None);
        assert_eq!(session.phase(), SessionPhase::Submitting);
    }

    #[test]
    fn manual_submit_after_time_up_is_rejected() {
        let mut session = mcq_session(1);
        session.on_time_up(fixed_now()).unwrap();
        assert!(matches!(
            session.request_submit(fixed_now()),
            Err(SessionError::AlreadySubmitted)
        ));
        assert!(matches!(
            session.confirm_submit(fixed_now()),
            Err(SessionError::AlreadySubmitted)
        ));
    }

    #[test]
    fn complete_requires_submission() {
        let mut session = mcq_session(1);
        assert!(matches!(
            session.complete(true),
            Err(SessionError::InvalidState(SessionPhase::InProgress))
        ));

        session.select_answer(QuestionId::new(1), 3).unwrap();
        session.request_submit(fixed_now()).unwrap();
        let route = session.complete(false).unwrap();
        assert_eq!(route.path(), "/exam/mcq/result/1");
        assert!(session.is_complete());
        assert_eq!(session.persisted(), Some(false));
    }

    #[test]
    fn written_submit_packages_uploads_as_pending() {
        let mut session = written_session(3);
        session
            .upload_images(QuestionId::new(3), vec![ImageFile::new("sheet.png", 99)])
            .unwrap();

        let gate = session.request_submit(fixed_now()).unwrap();
        assert_eq!(gate, SubmitGate::NeedsConfirmation { unanswered: 2 });
        let submission = session.confirm_submit(fixed_now()).unwrap();

        let ExamResult::Written(result) = submission.result else {
            panic!("expected written result");
        };
        assert_eq!(result.evaluation_status, EvaluationStatus::Pending);
        assert_eq!(result.submissions[&QuestionId::new(3)].len(), 1);
        assert_eq!(submission.route.path(), "/exam/written/result/1");
    }
}
