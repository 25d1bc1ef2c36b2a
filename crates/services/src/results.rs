use std::sync::Arc;

use chrono::{DateTime, Utc};
use exam_core::model::{
    EvaluationStatus, Exam, ExamId, McqResult, Question, QuestionId, WrittenResult,
};
use exam_core::scoring::{percentage, round_mark};
use storage::repository::{ExamRepository, QuestionRepository};
use storage::result_store::ResultStore;

use crate::Clock;
use crate::config::ExamSettings;
use crate::error::ResultsError;

/// Score line shown at the top of a results page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultSummary {
    pub score: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub passed: bool,
}

impl ResultSummary {
    #[must_use]
    pub fn new(score: f64, total_marks: f64, pass_percent: f64) -> Self {
        // Pass/fail is decided on the exact ratio; rounding is for display.
        let exact = if total_marks > 0.0 {
            score / total_marks * 100.0
        } else {
            0.0
        };
        Self {
            score: round_mark(score),
            total_marks,
            percentage: percentage(score, total_marks),
            passed: exact >= pass_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Correct,
    Wrong,
    Skipped,
}

/// One question in the MCQ answer review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub correct_index: usize,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct McqResultView {
    pub exam_id: ExamId,
    pub title: String,
    pub summary: ResultSummary,
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub submitted_at: DateTime<Utc>,
    /// Per-question review; `None` until the exam's reveal time has passed.
    pub review: Option<Vec<QuestionReview>>,
    pub reveal_at: Option<DateTime<Utc>>,
}

impl McqResultView {
    #[must_use]
    pub fn build(
        exam: &Exam,
        questions: &[Question],
        result: &McqResult,
        now: DateTime<Utc>,
        pass_percent: f64,
    ) -> Self {
        let review = exam.results_revealed(now).then(|| {
            questions
                .iter()
                .filter_map(Question::as_mcq)
                .map(|q| {
                    let selected = result.answers.get(&q.id()).copied().flatten();
                    let status = match selected {
                        None => ReviewStatus::Skipped,
                        Some(idx) if q.is_correct(idx) => ReviewStatus::Correct,
                        Some(_) => ReviewStatus::Wrong,
                    };
                    QuestionReview {
                        question_id: q.id(),
                        prompt: q.prompt().to_owned(),
                        options: q.options().to_vec(),
                        selected,
                        correct_index: q.correct_index(),
                        status,
                    }
                })
                .collect()
        });

        Self {
            exam_id: exam.id(),
            title: exam.title().to_owned(),
            summary: ResultSummary::new(result.total_mark, exam.total_marks(), pass_percent),
            correct: result.correct_count,
            wrong: result.wrong_count,
            skipped: result.skipped_count,
            submitted_at: result.submitted_at,
            review,
            reveal_at: exam.reveal_results_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenResultView {
    pub exam_id: ExamId,
    pub title: String,
    pub status: EvaluationStatus,
    pub total_questions: usize,
    pub submitted_questions: usize,
    pub image_count: usize,
    pub submitted_at: DateTime<Utc>,
}

impl WrittenResultView {
    #[must_use]
    pub fn build(exam: &Exam, questions: &[Question], result: &WrittenResult) -> Self {
        Self {
            exam_id: exam.id(),
            title: exam.title().to_owned(),
            status: result.evaluation_status,
            total_questions: questions.len(),
            submitted_questions: result.submissions.len(),
            image_count: result.submissions.values().map(Vec::len).sum(),
            submitted_at: result.submitted_at,
        }
    }

    #[must_use]
    pub fn notice(&self) -> &'static str {
        match self.status {
            EvaluationStatus::Pending => {
                "Your answers were submitted and are waiting to be evaluated."
            }
            EvaluationStatus::Evaluated => "Your answers have been evaluated.",
        }
    }
}

/// Builds results pages from the short-lived result store.
#[derive(Clone)]
pub struct ResultsService {
    clock: Clock,
    pass_percent: f64,
    exams: Arc<dyn ExamRepository>,
    questions: Arc<dyn QuestionRepository>,
    results: ResultStore,
}

impl ResultsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: &ExamSettings,
        exams: Arc<dyn ExamRepository>,
        questions: Arc<dyn QuestionRepository>,
        results: ResultStore,
    ) -> Self {
        Self {
            clock,
            pass_percent: settings.pass_percent(),
            exams,
            questions,
            results,
        }
    }

    /// # Errors
    ///
    /// Returns `ResultsError::MissingResult` when nothing was stored for the
    /// exam, `ResultsError::ExamNotFound` for unknown exams, or storage errors.
    pub async fn mcq_view(&self, exam_id: ExamId) -> Result<McqResultView, ResultsError> {
        let result = self
            .results
            .load_mcq(exam_id)?
            .ok_or(ResultsError::MissingResult(exam_id))?;
        let (exam, questions) = self.content(exam_id).await?;
        Ok(McqResultView::build(
            &exam,
            &questions,
            &result,
            self.clock.now(),
            self.pass_percent,
        ))
    }

    /// # Errors
    ///
    /// Returns `ResultsError::MissingResult` when nothing was stored for the
    /// exam, `ResultsError::ExamNotFound` for unknown exams, or storage errors.
    pub async fn written_view(&self, exam_id: ExamId) -> Result<WrittenResultView, ResultsError> {
        let result = self
            .results
            .load_written(exam_id)?
            .ok_or(ResultsError::MissingResult(exam_id))?;
        let (exam, questions) = self.content(exam_id).await?;
        Ok(WrittenResultView::build(&exam, &questions, &result))
    }

    async fn content(&self, exam_id: ExamId) -> Result<(Exam, Vec<Question>), ResultsError> {
        let exam = self
            .exams
            .get_exam(exam_id)
            .await?
            .ok_or(ResultsError::ExamNotFound(exam_id))?;
        let questions = self.questions.get_questions(exam_id).await?;
        Ok((exam, questions))
    }
}
