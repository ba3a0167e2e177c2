use serde::Serialize;

/// Counters produced by one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub events: usize,
    pub members: usize,
    pub created: usize,
    pub already_present: usize,
    pub skipped_terminal: usize,
    pub config_skipped: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.errored == 0 && self.config_skipped == 0
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Another pass held the lock; nothing was done.
    Skipped { lock: String },
    Completed(RunSummary),
}
