use exam_core::model::{ExamId, ImageFile, QuestionId, normalize_answer_key};
use services::{
    AppServices, McqResultView, ResultRoute, ReviewStatus, SessionPhase, SubmitOutcome,
    SubmitStep, WrittenResultView,
};

use crate::ArgsError;

/// Answers and flags for one headless attempt.
#[derive(Debug, Clone, Default)]
pub struct TakePlan {
    pub exam_id: Option<ExamId>,
    pub answers: Vec<(QuestionId, usize)>,
    pub uploads: Vec<(QuestionId, String)>,
    pub confirm: bool,
    pub time_up: bool,
}

impl TakePlan {
    /// Parse `QID=KEY`, where `KEY` is `A`–`D` or `1`–`4`.
    pub fn push_answer(&mut self, raw: &str) -> Result<(), ArgsError> {
        let (qid, key) = split_pair("--answer", raw)?;
        let option = normalize_answer_key(key).map_err(|_| ArgsError::InvalidValue {
            flag: "--answer",
            raw: raw.to_owned(),
        })?;
        self.answers.push((qid, option));
        Ok(())
    }

    /// Parse `QID=PATH`.
    pub fn push_upload(&mut self, raw: &str) -> Result<(), ArgsError> {
        let (qid, path) = split_pair("--upload", raw)?;
        if path.trim().is_empty() {
            return Err(ArgsError::InvalidValue {
                flag: "--upload",
                raw: raw.to_owned(),
            });
        }
        self.uploads.push((qid, path.to_owned()));
        Ok(())
    }
}

fn split_pair<'a>(flag: &'static str, raw: &'a str) -> Result<(QuestionId, &'a str), ArgsError> {
    let invalid = || ArgsError::InvalidValue {
        flag,
        raw: raw.to_owned(),
    };
    let (qid, value) = raw.split_once('=').ok_or_else(invalid)?;
    let qid: QuestionId = qid.parse().map_err(|_| invalid())?;
    Ok((qid, value))
}

pub async fn run_take(
    app: &AppServices,
    exam_id: ExamId,
    plan: TakePlan,
) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = app.sessions();
    let mut session = sessions.load(exam_id).await;
    if session.phase() == SessionPhase::NotFound {
        println!("Exam not found.");
        return Ok(());
    }

    for (qid, option) in plan.answers {
        session.select_answer(qid, option)?;
    }
    for (qid, path) in plan.uploads {
        let size = std::fs::metadata(&path)?.len();
        let file_name = std::path::Path::new(&path)
            .file_name()
            .map_or_else(|| path.clone(), |n| n.to_string_lossy().into_owned());
        session.upload_images(qid, vec![ImageFile::new(file_name, size)])?;
    }

    let progress = session.progress();
    println!(
        "Answered {}/{} questions.",
        progress.answered, progress.total
    );

    let outcome = if plan.time_up {
        println!("Time is up.");
        match sessions.time_up(&mut session)? {
            Some(outcome) => outcome,
            None => return Ok(()),
        }
    } else {
        match sessions.request_submit(&mut session)? {
            SubmitStep::Submitted(outcome) => outcome,
            SubmitStep::NeedsConfirmation { unanswered } if plan.confirm => {
                println!("Submitting with {unanswered} unanswered question(s).");
                sessions.confirm_submit(&mut session)?
            }
            SubmitStep::NeedsConfirmation { unanswered } => {
                println!(
                    "{unanswered} question(s) unanswered. Pass --confirm to submit anyway."
                );
                session.cancel_submit()?;
                return Ok(());
            }
        }
    };

    print_outcome(app, &outcome).await
}

async fn print_outcome(
    app: &AppServices,
    outcome: &SubmitOutcome,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Submitted. Redirecting to {}", outcome.route);
    if !outcome.persisted {
        println!("Warning: the result could not be saved and will not survive this run.");
        return Ok(());
    }

    match outcome.route {
        ResultRoute::Mcq(id) => print_mcq(&app.results().mcq_view(id).await?),
        ResultRoute::Written(id) => print_written(&app.results().written_view(id).await?),
    }
    Ok(())
}

fn print_mcq(view: &McqResultView) {
    println!();
    println!("{}", view.title);
    println!(
        "Score: {} / {} ({}%) {}",
        view.summary.score,
        view.summary.total_marks,
        view.summary.percentage,
        if view.summary.passed { "PASS" } else { "FAIL" }
    );
    println!(
        "Correct {}  Wrong {}  Skipped {}",
        view.correct, view.wrong, view.skipped
    );

    let Some(review) = &view.review else {
        if let Some(at) = view.reveal_at {
            println!("Answers are revealed at {at}.");
        }
        return;
    };
    for item in review {
        let mark = match item.status {
            ReviewStatus::Correct => "ok",
            ReviewStatus::Wrong => "x",
            ReviewStatus::Skipped => "-",
        };
        let picked = item
            .selected
            .and_then(|i| item.options.get(i))
            .map_or("(skipped)", String::as_str);
        let correct = item
            .options
            .get(item.correct_index)
            .map_or("", String::as_str);
        println!(
            "[{mark:>2}] Q{} {}  you: {picked}  answer: {correct}",
            item.question_id, item.prompt
        );
    }
}

fn print_written(view: &WrittenResultView) {
    println!();
    println!("{}", view.title);
    println!(
        "Submitted {} of {} questions, {} image(s).",
        view.submitted_questions, view.total_questions, view.image_count
    );
    println!("{}", view.notice());
}
