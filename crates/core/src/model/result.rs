use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::{Answer, AnswerSheet, ImageRef};
use crate::model::exam::ExamKind;
use crate::model::ids::{ExamId, QuestionId};
use crate::scoring::McqScore;

//
// ─── MCQ ──────────────────────────────────────────────────────────────────────
//

/// Scored outcome of an MCQ attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqResult {
    pub exam_id: ExamId,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub skipped_count: usize,
    pub total_mark: f64,
    /// Selected option per question; `None` for skipped questions.
    pub answers: BTreeMap<QuestionId, Option<usize>>,
    pub submitted_at: DateTime<Utc>,
}

impl McqResult {
    #[must_use]
    pub fn new(
        exam_id: ExamId,
        score: McqScore,
        sheet: &AnswerSheet,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let answers = sheet
            .iter()
            .filter_map(|(id, answer)| match answer {
                Answer::Mcq(selected) => Some((id, *selected)),
                Answer::Written(_) => None,
            })
            .collect();

        Self {
            exam_id,
            correct_count: score.correct,
            wrong_count: score.wrong,
            skipped_count: score.skipped,
            total_mark: score.total_mark,
            answers,
            submitted_at,
        }
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.correct_count + self.wrong_count + self.skipped_count
    }
}

//
// ─── WRITTEN ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    Evaluated,
}

/// Written submission awaiting a human evaluator. Carries no score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrittenResult {
    pub exam_id: ExamId,
    /// Image references per question that received at least one upload.
    pub submissions: BTreeMap<QuestionId, Vec<ImageRef>>,
    pub evaluation_status: EvaluationStatus,
    pub submitted_at: DateTime<Utc>,
}

impl WrittenResult {
    #[must_use]
    pub fn pending(exam_id: ExamId, sheet: &AnswerSheet, submitted_at: DateTime<Utc>) -> Self {
        let submissions = sheet
            .iter()
            .filter_map(|(id, answer)| match answer {
                Answer::Written(images) if !images.is_empty() => Some((
                    id,
                    images.iter().map(|img| img.local_ref.clone()).collect(),
                )),
                _ => None,
            })
            .collect();

        Self {
            exam_id,
            submissions,
            evaluation_status: EvaluationStatus::Pending,
            submitted_at,
        }
    }
}

//
// ─── EXAM RESULT ──────────────────────────────────────────────────────────────
//

/// Outcome of a submitted attempt.
///
/// Each variant is stored on its own under a kind-specific key, so the enum
/// itself has no wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum ExamResult {
    Mcq(McqResult),
    Written(WrittenResult),
}

impl ExamResult {
    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        match self {
            ExamResult::Mcq(r) => r.exam_id,
            ExamResult::Written(r) => r.exam_id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ExamKind {
        match self {
            ExamResult::Mcq(_) => ExamKind::Mcq,
            ExamResult::Written(_) => ExamKind::Written,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
