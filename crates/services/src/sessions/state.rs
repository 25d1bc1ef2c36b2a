use std::fmt;

use exam_core::model::{ExamId, ExamKind, ExamResult};

/// Where an exam session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    /// Exam missing, inactive, or without questions. Terminal.
    NotFound,
    InProgress,
    /// Submit was requested with unanswered questions; waiting for the user.
    ConfirmingSubmit { unanswered: usize },
    Submitting,
    Completed,
}

impl SessionPhase {
    /// Whether answers may still change.
    #[must_use]
    pub fn accepts_answers(self) -> bool {
        matches!(
            self,
            SessionPhase::InProgress | SessionPhase::ConfirmingSubmit { .. }
        )
    }

    #[must_use]
    pub fn is_submitted(self) -> bool {
        matches!(self, SessionPhase::Submitting | SessionPhase::Completed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Loading => f.write_str("loading"),
            SessionPhase::NotFound => f.write_str("not found"),
            SessionPhase::InProgress => f.write_str("in progress"),
            SessionPhase::ConfirmingSubmit { .. } => f.write_str("confirming submit"),
            SessionPhase::Submitting => f.write_str("submitting"),
            SessionPhase::Completed => f.write_str("completed"),
        }
    }
}

/// What caused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// All questions answered and submit requested.
    Manual,
    /// User confirmed submitting with unanswered questions.
    Confirmed,
    /// Countdown reached zero.
    TimeUp,
}

/// Results page a completed session navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultRoute {
    Mcq(ExamId),
    Written(ExamId),
}

impl ResultRoute {
    #[must_use]
    pub fn for_exam(kind: ExamKind, exam_id: ExamId) -> Self {
        match kind {
            ExamKind::Mcq => ResultRoute::Mcq(exam_id),
            ExamKind::Written => ResultRoute::Written(exam_id),
        }
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        match self {
            ResultRoute::Mcq(id) | ResultRoute::Written(id) => *id,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResultRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultRoute::Mcq(id) => write!(f, "/exam/mcq/result/{id}"),
            ResultRoute::Written(id) => write!(f, "/exam/written/result/{id}"),
        }
    }
}

/// Frozen answers, packaged as a result, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub exam_id: ExamId,
    pub result: ExamResult,
    pub route: ResultRoute,
    pub trigger: SubmitTrigger,
}

/// Outcome of a submit request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitGate {
    /// Unanswered questions remain; call `confirm_submit` or `cancel_submit`.
    NeedsConfirmation { unanswered: usize },
    Ready(Submission),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_render_result_paths() {
        assert_eq!(
            ResultRoute::for_exam(ExamKind::Mcq, ExamId::new(12)).path(),
            "/exam/mcq/result/12"
        );
        assert_eq!(
            ResultRoute::for_exam(ExamKind::Written, ExamId::new(3)).to_string(),
            "/exam/written/result/3"
        );
    }

    #[test]
    fn confirming_still_accepts_answers() {
        assert!(SessionPhase::ConfirmingSubmit { unanswered: 2 }.accepts_answers());
        assert!(!SessionPhase::Submitting.accepts_answers());
        assert!(SessionPhase::Completed.is_submitted());
    }
}
