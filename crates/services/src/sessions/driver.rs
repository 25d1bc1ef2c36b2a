use exam_core::model::{ImageFile, QuestionId};
use tokio::sync::mpsc;

use super::controller::ExamSession;
use super::state::SessionPhase;
use super::timer::TimerEvent;
use super::workflow::{ExamSessionService, SubmitOutcome, SubmitStep};
use crate::error::SessionError;

/// User input for a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SelectAnswer { question_id: QuestionId, option: usize },
    UploadImages { question_id: QuestionId, files: Vec<ImageFile> },
    RequestSubmit,
    ConfirmSubmit,
    CancelSubmit,
}

/// Feedback sent back while a session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Tick { remaining_secs: u64 },
    ConfirmationRequired { unanswered: usize },
    Rejected { reason: String },
    Submitted(SubmitOutcome),
}

/// Run an in-progress session until it is submitted.
///
/// Countdown events and user actions are applied one at a time, so whichever
/// of expiry or a manual submit arrives first is the only submission. The
/// countdown is disarmed when the loop ends.
///
/// # Errors
///
/// Returns `SessionError::Abandoned` if the action channel closes before
/// submission, or the error from starting the session.
pub async fn drive(
    service: &ExamSessionService,
    session: &mut ExamSession,
    mut actions: mpsc::Receiver<SessionAction>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
) -> Result<SubmitOutcome, SessionError> {
    let mut timer = service.start_timer(session)?;
    let mut timer_live = true;

    let outcome = loop {
        tokio::select! {
            biased;

            event = timer.next_event(), if timer_live => match event {
                Some(TimerEvent::Tick { remaining_secs }) => {
                    notify(&updates, SessionUpdate::Tick { remaining_secs });
                }
                Some(TimerEvent::Expired) => {
                    timer_live = false;
                    if let Some(outcome) = service.time_up(session)? {
                        break outcome;
                    }
                }
                None => timer_live = false,
            },

            action = actions.recv() => {
                let Some(action) = action else {
                    tracing::info!(exam_id = %session.exam_id(), "session abandoned before submit");
                    timer.disarm();
                    return Err(SessionError::Abandoned);
                };
                match apply(service, session, action) {
                    Ok(Some(outcome)) => break outcome,
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(exam_id = %session.exam_id(), error = %err, "action rejected");
                        notify(
                            &updates,
                            SessionUpdate::Rejected {
                                reason: err.to_string(),
                            },
                        );
                    }
                }
                if let Some(unanswered) = pending_confirmation(session) {
                    notify(&updates, SessionUpdate::ConfirmationRequired { unanswered });
                }
            }
        }
    };

    timer.disarm();
    notify(&updates, SessionUpdate::Submitted(outcome.clone()));
    Ok(outcome)
}

fn apply(
    service: &ExamSessionService,
    session: &mut ExamSession,
    action: SessionAction,
) -> Result<Option<SubmitOutcome>, SessionError> {
    match action {
        SessionAction::SelectAnswer {
            question_id,
            option,
        } => session.select_answer(question_id, option).map(|()| None),
        SessionAction::UploadImages { question_id, files } => {
            session.upload_images(question_id, files).map(|_| None)
        }
        SessionAction::RequestSubmit => match service.request_submit(session)? {
            SubmitStep::NeedsConfirmation { .. } => Ok(None),
            SubmitStep::Submitted(outcome) => Ok(Some(outcome)),
        },
        SessionAction::ConfirmSubmit => service.confirm_submit(session).map(Some),
        SessionAction::CancelSubmit => session.cancel_submit().map(|()| None),
    }
}

// The session keeps running when nobody listens for updates.
fn notify(updates: &mpsc::UnboundedSender<SessionUpdate>, update: SessionUpdate) {
    if updates.send(update).is_err() {
        tracing::debug!("session update receiver dropped");
    }
}

fn pending_confirmation(session: &ExamSession) -> Option<usize> {
    match session.phase() {
        SessionPhase::ConfirmingSubmit { unanswered } => Some(unanswered),
        _ => None,
    }
}
