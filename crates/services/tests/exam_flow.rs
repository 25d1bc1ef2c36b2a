use std::sync::Arc;

use exam_core::model::{
    CorrectAnswer, EvaluationStatus, Exam, ExamDraft, ExamId, ExamKind, ExamResult, ImageFile,
    McqQuestion, Question, QuestionId, WrittenQuestion,
};
use exam_core::time::fixed_now;
use services::{AppServices, Clock, ExamSettings, ResultsError, SessionPhase, SubmitStep};
use storage::repository::Storage;
use storage::result_store::result_key;
use storage::session_store::{InMemorySessionStore, KeyValueStore};

fn exam(id: u64, kind: ExamKind, total_marks: f64) -> Exam {
    ExamDraft {
        id: ExamId::new(id),
        kind,
        title: format!("Exam {id}"),
        description: Some("Mock test".into()),
        duration_minutes: 30,
        total_marks,
        is_premium: false,
        is_active: true,
        starts_at: fixed_now(),
        reveal_results_at: None,
    }
    .validate()
    .unwrap()
}

async fn seed(storage: &Storage) {
    storage
        .exams
        .upsert_exam(&exam(1, ExamKind::Mcq, 10.0))
        .await
        .unwrap();
    for id in 1..=10_u64 {
        let q = McqQuestion::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            &CorrectAnswer::Key("C".into()),
        )
        .unwrap();
        storage
            .questions
            .upsert_question(ExamId::new(1), u32::try_from(id).unwrap(), &Question::Mcq(q))
            .await
            .unwrap();
    }

    storage
        .exams
        .upsert_exam(&exam(2, ExamKind::Written, 30.0))
        .await
        .unwrap();
    for id in 1..=3_u64 {
        let q = WrittenQuestion::new(QuestionId::new(id), format!("Essay {id}"), 10.0).unwrap();
        storage
            .questions
            .upsert_question(ExamId::new(2), u32::try_from(id).unwrap(), &Question::Written(q))
            .await
            .unwrap();
    }
}

async fn app_with_store(store: Arc<dyn KeyValueStore>) -> AppServices {
    let storage = Storage::in_memory();
    seed(&storage).await;
    AppServices::from_storage(storage, store, Clock::fixed(fixed_now()), ExamSettings::default())
}

#[tokio::test]
async fn mcq_attempt_with_two_skips_scores_five_and_a_half() {
    let store = Arc::new(InMemorySessionStore::new());
    let app = app_with_store(store.clone()).await;
    let sessions = app.sessions();

    let mut session = sessions.load(ExamId::new(1)).await;
    assert_eq!(session.phase(), SessionPhase::InProgress);

    for id in 1..=6 {
        session.select_answer(QuestionId::new(id), 2).unwrap();
    }
    session.select_answer(QuestionId::new(7), 0).unwrap();
    session.select_answer(QuestionId::new(8), 3).unwrap();

    let step = sessions.request_submit(&mut session).unwrap();
    assert_eq!(step, SubmitStep::NeedsConfirmation { unanswered: 2 });

    let outcome = sessions.confirm_submit(&mut session).unwrap();
    assert!(outcome.persisted);
    assert_eq!(outcome.route.path(), "/exam/mcq/result/1");
    let ExamResult::Mcq(result) = &outcome.result else {
        panic!("expected MCQ result");
    };
    assert_eq!(
        (result.correct_count, result.wrong_count, result.skipped_count),
        (6, 2, 2)
    );
    assert!((result.total_mark - 5.5).abs() < f64::EPSILON);
    assert_eq!(result.answers[&QuestionId::new(9)], None);

    assert!(
        store
            .get(&result_key(ExamKind::Mcq, ExamId::new(1)))
            .unwrap()
            .is_some()
    );

    let view = app.results().mcq_view(ExamId::new(1)).await.unwrap();
    assert!((view.summary.percentage - 55.0).abs() < 1e-9);
    assert!(view.summary.passed);
    assert_eq!(view.review.map(|r| r.len()), Some(10));
}

#[tokio::test]
async fn written_attempt_is_pending_with_one_image() {
    let app = app_with_store(Arc::new(InMemorySessionStore::new())).await;
    let sessions = app.sessions();

    let mut session = sessions.load(ExamId::new(2)).await;
    session
        .upload_images(QuestionId::new(3), vec![ImageFile::new("page1.jpg", 120_000)])
        .unwrap();

    let step = sessions.request_submit(&mut session).unwrap();
    assert_eq!(step, SubmitStep::NeedsConfirmation { unanswered: 2 });
    let outcome = sessions.confirm_submit(&mut session).unwrap();
    assert_eq!(outcome.route.path(), "/exam/written/result/2");

    let ExamResult::Written(result) = &outcome.result else {
        panic!("expected written result");
    };
    assert_eq!(result.evaluation_status, EvaluationStatus::Pending);
    assert_eq!(result.submissions.len(), 1);
    assert_eq!(result.submissions[&QuestionId::new(3)].len(), 1);

    let view = app.results().written_view(ExamId::new(2)).await.unwrap();
    assert_eq!(view.status, EvaluationStatus::Pending);
    assert_eq!((view.submitted_questions, view.image_count), (1, 1));
    assert_eq!(view.total_questions, 3);
}

#[tokio::test]
async fn full_store_keeps_result_in_memory_only() {
    let app = app_with_store(Arc::new(InMemorySessionStore::new().with_quota(8))).await;
    let sessions = app.sessions();

    let mut session = sessions.load(ExamId::new(1)).await;
    sessions.request_submit(&mut session).unwrap();
    let outcome = sessions.confirm_submit(&mut session).unwrap();

    assert!(!outcome.persisted);
    assert_eq!(session.phase(), SessionPhase::Completed);
    assert!(matches!(
        app.results().mcq_view(ExamId::new(1)).await,
        Err(ResultsError::MissingResult(_))
    ));
}

#[tokio::test]
async fn exam_without_questions_is_not_found() {
    let app = app_with_store(Arc::new(InMemorySessionStore::new())).await;
    app.storage()
        .exams
        .upsert_exam(&exam(3, ExamKind::Mcq, 5.0))
        .await
        .unwrap();

    let sessions = app.sessions();
    let mut session = sessions.load(ExamId::new(3)).await;
    assert_eq!(session.phase(), SessionPhase::NotFound);
    assert!(sessions.start_timer(&session).is_err());
    assert!(sessions.request_submit(&mut session).is_err());
    assert!(sessions.confirm_submit(&mut session).is_err());
    assert!(session.submission().is_none());
}

#[tokio::test]
async fn active_exams_lists_seeded_content() {
    let app = app_with_store(Arc::new(InMemorySessionStore::new())).await;
    let exams = app.active_exams(10).await.unwrap();
    assert_eq!(exams.len(), 2);
}
