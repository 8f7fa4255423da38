// ABOUTME: Operator identity recorded on every status write.
// ABOUTME: Falls back to the system operator for unattributed runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier reserved for runs not attributed to a user.
pub const SYSTEM_OPERATOR: &str = "system";

/// The actor a status change is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operator(String);

impl Operator {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The system operator, used when no user initiated the run.
    pub fn system() -> Self {
        Self(SYSTEM_OPERATOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
