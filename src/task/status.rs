// ABOUTME: Per-target status state machine for a distribution run.
// ABOUTME: Terminal statuses are never revisited within the same run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single deployment target within a run.
///
/// A target occupies exactly one status at a time. Once it reaches a
/// terminal status (`Ok`, `Failed`, `Cancelled`) it is not touched again
/// for the remainder of the run; a later run resets it to `Prepared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Registered but not yet touched by any run.
    Waiting,
    /// Claimed by an active run, before its executor has been dispatched.
    Prepared,
    /// The remote request has been issued and a response is awaited.
    Running,
    /// The remote agent reported success.
    Ok,
    /// The remote agent reported failure, or the request itself failed.
    Failed,
    /// Skipped because an earlier ordered step failed fatally, or the run
    /// was cancelled before this target was reached.
    Cancelled,
}

impl Status {
    /// Whether this status ends the target's participation in the run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Ok | Status::Failed | Status::Cancelled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Waiting => "waiting",
            Status::Prepared => "prepared",
            Status::Running => "running",
            Status::Ok => "ok",
            Status::Failed => "failed",
            Status::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}
