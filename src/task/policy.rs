// ABOUTME: Rollout policy selection and its mapping to agent after-actions.
// ABOUTME: Unknown stored codes fail loudly instead of defaulting silently.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Raised when a stored policy code does not match any known policy.
///
/// The original behavior of silently falling back to "no restart" masked
/// misconfigured tasks, so unknown codes abort the run instead.
#[derive(Debug, Error)]
#[error("unknown rollout policy code: {code}")]
pub struct UnknownPolicy {
    pub code: u8,
}

/// Strategy governing parallel vs. sequential execution of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutPolicy {
    /// Push only, no restart; all targets run in parallel.
    None,

    /// Push and restart; all targets run in parallel.
    ParallelRestart,

    /// Push and restart one target at a time with an inter-step delay.
    /// A failed step does not stop the sequence.
    OrderedRestart,

    /// Like `OrderedRestart`, but the first failure cancels every
    /// remaining un-run target.
    OrderedRestartStrict,
}

impl RolloutPolicy {
    /// Whether targets run one at a time in task order.
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            RolloutPolicy::OrderedRestart | RolloutPolicy::OrderedRestartStrict
        )
    }

    /// The stored wire code for this policy.
    pub fn code(self) -> u8 {
        match self {
            RolloutPolicy::None => 0,
            RolloutPolicy::ParallelRestart => 1,
            RolloutPolicy::OrderedRestartStrict => 2,
            RolloutPolicy::OrderedRestart => 3,
        }
    }

    /// The after-action the remote agent should perform once the artifact
    /// lands. `None` carries no after-action even in ordered modes.
    pub fn after_action(self) -> Option<AfterAction> {
        match self {
            RolloutPolicy::None => None,
            RolloutPolicy::ParallelRestart => Some(AfterAction::Restart),
            RolloutPolicy::OrderedRestart => Some(AfterAction::OrderedRestart),
            RolloutPolicy::OrderedRestartStrict => Some(AfterAction::OrderedRestartStrict),
        }
    }
}

impl TryFrom<u8> for RolloutPolicy {
    type Error = UnknownPolicy;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RolloutPolicy::None),
            1 => Ok(RolloutPolicy::ParallelRestart),
            2 => Ok(RolloutPolicy::OrderedRestartStrict),
            3 => Ok(RolloutPolicy::OrderedRestart),
            code => Err(UnknownPolicy { code }),
        }
    }
}

/// Post-upload action requested from the remote agent, serialized as the
/// agent protocol's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterAction {
    Restart,
    OrderedRestartStrict,
    OrderedRestart,
}

impl AfterAction {
    pub fn code(self) -> u8 {
        match self {
            AfterAction::Restart => 1,
            AfterAction::OrderedRestartStrict => 2,
            AfterAction::OrderedRestart => 3,
        }
    }
}

impl Serialize for AfterAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}
