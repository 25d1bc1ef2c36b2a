mod controller;
mod driver;
mod progress;
mod state;
mod timer;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::ExamSession;
pub use driver::{SessionAction, SessionUpdate, drive};
pub use progress::SessionProgress;
pub use state::{ResultRoute, SessionPhase, SubmitGate, SubmitTrigger, Submission};
pub use timer::{Countdown, CountdownTimer, TimerEvent};
pub use workflow::{ExamSessionService, SubmitOutcome, SubmitStep};
