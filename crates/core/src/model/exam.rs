use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ExamId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("exam title cannot be empty")]
    EmptyTitle,

    #[error("exam duration must be at least one minute")]
    ZeroDuration,

    #[error("total marks must be a positive finite number, got {0}")]
    InvalidTotalMarks(f64),
}

//
// ─── EXAM KIND ────────────────────────────────────────────────────────────────
//

/// Which submission path an exam takes.
///
/// `Mcq` exams are scored on submit; `Written` exams are packaged for a human
/// evaluator and carry no score until evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamKind {
    Mcq,
    Written,
}

impl ExamKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamKind::Mcq => "mcq",
            ExamKind::Written => "written",
        }
    }
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// Unvalidated exam data as delivered by a content source.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamDraft {
    pub id: ExamId,
    pub kind: ExamKind,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub total_marks: f64,
    pub is_premium: bool,
    pub is_active: bool,
    pub starts_at: DateTime<Utc>,
    pub reveal_results_at: Option<DateTime<Utc>>,
}

impl ExamDraft {
    /// Validate and normalize the draft into an immutable `Exam`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` if the title is blank, the duration is zero, or the
    /// total marks are not a positive finite number.
    pub fn validate(self) -> Result<Exam, ExamError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ExamError::EmptyTitle);
        }
        if self.duration_minutes == 0 {
            return Err(ExamError::ZeroDuration);
        }
        if !self.total_marks.is_finite() || self.total_marks <= 0.0 {
            return Err(ExamError::InvalidTotalMarks(self.total_marks));
        }

        let description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Exam {
            id: self.id,
            kind: self.kind,
            title,
            description,
            duration_minutes: self.duration_minutes,
            total_marks: self.total_marks,
            is_premium: self.is_premium,
            is_active: self.is_active,
            starts_at: self.starts_at,
            reveal_results_at: self.reveal_results_at,
        })
    }
}

//
// ─── EXAM ─────────────────────────────────────────────────────────────────────
//

/// An exam as loaded for a session. Read-only once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    id: ExamId,
    kind: ExamKind,
    title: String,
    description: Option<String>,
    duration_minutes: u32,
    total_marks: f64,
    is_premium: bool,
    is_active: bool,
    starts_at: DateTime<Utc>,
    reveal_results_at: Option<DateTime<Utc>>,
}

impl Exam {
    #[must_use]
    pub fn id(&self) -> ExamId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> ExamKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Countdown length for a session of this exam.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    #[must_use]
    pub fn total_marks(&self) -> f64 {
        self.total_marks
    }

    #[must_use]
    pub fn is_premium(&self) -> bool {
        self.is_premium
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    #[must_use]
    pub fn reveal_results_at(&self) -> Option<DateTime<Utc>> {
        self.reveal_results_at
    }

    /// Whether the per-question review may be shown at `now`.
    ///
    /// Exams without a reveal time show details immediately.
    #[must_use]
    pub fn results_revealed(&self, now: DateTime<Utc>) -> bool {
        self.reveal_results_at.is_none_or(|at| now >= at)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
