use exam_core::model::{
    CorrectAnswer, ExamDraft, ExamId, ExamKind, McqQuestion, Question, QuestionId, WrittenQuestion,
};
use services::Clock;
use storage::repository::Storage;

pub const DEMO_MCQ_EXAM: u64 = 1;
pub const DEMO_WRITTEN_EXAM: u64 = 2;

// Prompt, options, and the answer key as content authors enter it.
const MCQ_ITEMS: [(&str, [&str; 4], &str); 10] = [
    ("What is 7 x 8?", ["54", "56", "58", "64"], "B"),
    ("Capital of Japan?", ["Kyoto", "Osaka", "Tokyo", "Nagoya"], "c"),
    ("H2O is commonly called?", ["Water", "Salt", "Ozone", "Sand"], "1"),
    ("Largest planet?", ["Mars", "Venus", "Earth", "Jupiter"], "D"),
    ("Square root of 81?", ["7", "8", "9", "10"], "3"),
    ("Fastest land animal?", ["Cheetah", "Horse", "Lion", "Hare"], "a"),
    ("Boiling point of water at sea level (C)?", ["90", "95", "100", "110"], "C"),
    ("Author of 'Hamlet'?", ["Dickens", "Shakespeare", "Austen", "Twain"], "2"),
    ("Chemical symbol for gold?", ["Ag", "Gd", "Go", "Au"], "4"),
    ("How many continents are there?", ["5", "6", "7", "8"], "C"),
];

const WRITTEN_ITEMS: [(&str, f64); 3] = [
    ("Explain the water cycle.", 10.0),
    ("Describe the causes of the First World War.", 15.0),
    ("Solve and show your working: 3x + 7 = 22.", 5.0),
];

/// Insert one MCQ and one written demo exam, replacing earlier copies.
///
/// # Errors
///
/// Returns an error if validation or storage writes fail.
pub async fn seed_demo(storage: &Storage, clock: Clock) -> Result<(), Box<dyn std::error::Error>> {
    let now = clock.now();

    let mcq_id = ExamId::new(DEMO_MCQ_EXAM);
    let mcq = ExamDraft {
        id: mcq_id,
        kind: ExamKind::Mcq,
        title: "General knowledge mock test".into(),
        description: Some("Ten questions, quarter-mark penalty per wrong answer.".into()),
        duration_minutes: 10,
        total_marks: 10.0,
        is_premium: false,
        is_active: true,
        starts_at: now,
        reveal_results_at: None,
    }
    .validate()?;
    storage.exams.upsert_exam(&mcq).await?;

    for (position, (prompt, options, key)) in (0_u32..).zip(MCQ_ITEMS) {
        let question = McqQuestion::new(
            QuestionId::new(u64::from(position) + 1),
            prompt,
            options.iter().map(|o| (*o).to_owned()).collect(),
            &CorrectAnswer::Key(key.to_owned()),
        )?;
        storage
            .questions
            .upsert_question(mcq_id, position, &Question::Mcq(question))
            .await?;
    }

    let written_id = ExamId::new(DEMO_WRITTEN_EXAM);
    let written = ExamDraft {
        id: written_id,
        kind: ExamKind::Written,
        title: "Short essay paper".into(),
        description: None,
        duration_minutes: 45,
        total_marks: WRITTEN_ITEMS.iter().map(|(_, marks)| marks).sum(),
        is_premium: true,
        is_active: true,
        starts_at: now,
        reveal_results_at: None,
    }
    .validate()?;
    storage.exams.upsert_exam(&written).await?;

    for (position, (prompt, marks)) in (0_u32..).zip(WRITTEN_ITEMS) {
        let question =
            WrittenQuestion::new(QuestionId::new(u64::from(position) + 1), prompt, marks)?;
        storage
            .questions
            .upsert_question(written_id, position, &Question::Written(question))
            .await?;
    }

    tracing::info!(
        mcq_questions = MCQ_ITEMS.len(),
        written_questions = WRITTEN_ITEMS.len(),
        "seeded demo exams"
    );
    Ok(())
}
