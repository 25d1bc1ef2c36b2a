use super::state::SessionPhase;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub phase: SessionPhase,
}

impl SessionProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.unanswered == 0
    }
}
