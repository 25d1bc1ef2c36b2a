//! MCQ scoring with negative marking.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerSheet, McqQuestion};

/// Marks awarded per correct answer and deducted per wrong one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkingScheme {
    pub mark_per_correct: f64,
    pub wrong_penalty: f64,
}

impl MarkingScheme {
    pub const DEFAULT_MARK_PER_CORRECT: f64 = 1.0;
    pub const DEFAULT_WRONG_PENALTY: f64 = 0.25;
}

impl Default for MarkingScheme {
    fn default() -> Self {
        Self {
            mark_per_correct: Self::DEFAULT_MARK_PER_CORRECT,
            wrong_penalty: Self::DEFAULT_WRONG_PENALTY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McqScore {
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub total_mark: f64,
}

/// Score an MCQ attempt in one pass over the questions.
///
/// A question is correct when the selection equals its correct index, wrong
/// when a different option is selected, and skipped when nothing is selected.
/// The mark is capped at `total_marks` but may go below zero.
#[must_use]
pub fn score_mcq(
    questions: &[&McqQuestion],
    sheet: &AnswerSheet,
    scheme: &MarkingScheme,
    total_marks: f64,
) -> McqScore {
    let mut correct = 0_usize;
    let mut wrong = 0_usize;
    let mut skipped = 0_usize;

    for question in questions {
        match sheet.selected(question.id()) {
            Some(selected) if question.is_correct(selected) => correct += 1,
            Some(_) => wrong += 1,
            None => skipped += 1,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let raw = correct as f64 * scheme.mark_per_correct - wrong as f64 * scheme.wrong_penalty;

    McqScore {
        correct,
        wrong,
        skipped,
        total_mark: raw.min(total_marks),
    }
}

/// Round a mark to two decimal places for display.
#[must_use]
pub fn round_mark(mark: f64) -> f64 {
    (mark * 100.0).round() / 100.0
}

/// Percentage of `total_marks` achieved, rounded to two decimals.
///
/// Returns zero when `total_marks` is not positive.
#[must_use]
pub fn percentage(mark: f64, total_marks: f64) -> f64 {
    if total_marks <= 0.0 {
        return 0.0;
    }
    round_mark(mark / total_marks * 100.0)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CorrectAnswer, Question, QuestionId};

    fn questions(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|i| {
                Question::Mcq(
                    McqQuestion::new(
                        QuestionId::new(i),
                        format!("Question {i}"),
                        vec!["A".into(), "B".into(), "C".into(), "D".into()],
                        &CorrectAnswer::Index(0),
                    )
                    .unwrap(),
                )
            })
            .collect()
    }

    fn mcq_refs(qs: &[Question]) -> Vec<&McqQuestion> {
        qs.iter().filter_map(Question::as_mcq).collect()
    }

    #[test]
    fn six_correct_two_wrong_two_skipped_scores_five_and_a_half() {
        let qs = questions(10);
        let mut sheet = AnswerSheet::for_questions(&qs);
        for i in 1..=6 {
            sheet.select(QuestionId::new(i), 0).unwrap();
        }
        sheet.select(QuestionId::new(7), 1).unwrap();
        sheet.select(QuestionId::new(8), 3).unwrap();

        let score = score_mcq(&mcq_refs(&qs), &sheet, &MarkingScheme::default(), 10.0);

        assert_eq!(score.correct, 6);
        assert_eq!(score.wrong, 2);
        assert_eq!(score.skipped, 2);
        assert!((score.total_mark - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn counts_always_cover_every_question() {
        let qs = questions(7);
        for answered in 0..=7_u64 {
            let mut sheet = AnswerSheet::for_questions(&qs);
            for i in 1..=answered {
                // alternate right and wrong selections
                sheet
                    .select(QuestionId::new(i), usize::from(i % 2 == 0))
                    .unwrap();
            }
            let score = score_mcq(&mcq_refs(&qs), &sheet, &MarkingScheme::default(), 7.0);
            assert_eq!(score.correct + score.wrong + score.skipped, 7);
            assert_eq!(score.skipped, 7 - answered as usize);
        }
    }

    #[test]
    fn all_wrong_goes_negative() {
        let qs = questions(4);
        let mut sheet = AnswerSheet::for_questions(&qs);
        for i in 1..=4 {
            sheet.select(QuestionId::new(i), 2).unwrap();
        }
        let score = score_mcq(&mcq_refs(&qs), &sheet, &MarkingScheme::default(), 4.0);
        assert!((score.total_mark + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mark_is_capped_at_total_marks() {
        let qs = questions(4);
        let mut sheet = AnswerSheet::for_questions(&qs);
        for i in 1..=4 {
            sheet.select(QuestionId::new(i), 0).unwrap();
        }
        let score = score_mcq(&mcq_refs(&qs), &sheet, &MarkingScheme::default(), 3.0);
        assert!((score.total_mark - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert!((percentage(5.5, 10.0) - 55.0).abs() < f64::EPSILON);
        assert!((percentage(1.0, 3.0) - 33.33).abs() < 1e-9);
        assert!(percentage(-0.75, 10.0) < 0.0);
        assert!(percentage(4.0, 0.0).abs() < f64::EPSILON);
    }
}
