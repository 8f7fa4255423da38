// ABOUTME: Distribution task and target data model.
// ABOUTME: Read-only to the orchestration core during a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::types::{DistributionId, NodeId, Operator, ProjectId};

use super::policy::{RolloutPolicy, UnknownPolicy};
use super::status::Status;

/// Default seconds to wait between ordered steps so a freshly restarted
/// process can begin serving before the next target is rolled.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// A named rollout definition covering one artifact and a set of targets.
///
/// Created by an external management workflow; the orchestration core only
/// reads it. The policy is persisted as its raw wire code so that a stored
/// value no known policy matches surfaces as a configuration error at run
/// time rather than silently degrading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionTask {
    pub id: DistributionId,

    /// Targets in rollout order. Ordered policies honor this order.
    pub targets: Vec<Target>,

    /// Raw stored rollout policy code; see [`DistributionTask::policy`].
    pub policy_code: u8,

    /// Delay between ordered steps. Ignored by parallel policies.
    #[serde(default = "default_interval")]
    pub interval: Duration,

    /// Wipe the target directory on the remote side before writing.
    #[serde(default)]
    pub clear_old: bool,

    /// Stop the remote process before overwriting its files.
    #[serde(default)]
    pub close_first: bool,
}

fn default_interval() -> Duration {
    Duration::from_secs(DEFAULT_INTERVAL_SECS)
}

impl DistributionTask {
    pub fn new(id: DistributionId, targets: Vec<Target>, policy: RolloutPolicy) -> Self {
        Self {
            id,
            targets,
            policy_code: policy.code(),
            interval: default_interval(),
            clear_old: false,
            close_first: false,
        }
    }

    /// Resolve the stored policy code, failing on unknown values.
    pub fn policy(&self) -> Result<RolloutPolicy, UnknownPolicy> {
        RolloutPolicy::try_from(self.policy_code)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_clear_old(mut self, clear_old: bool) -> Self {
        self.clear_old = clear_old;
        self
    }

    pub fn with_close_first(mut self, close_first: bool) -> Self {
        self.close_first = close_first;
        self
    }
}

/// One (node, project) deployment destination within a task, optionally
/// scoped to a named process copy and a sub-path within project storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub node: NodeId,
    pub project: ProjectId,

    /// Named process copy within the project, when the project runs several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<String>,

    /// Sub-path hint within the project's storage directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,
}

impl Target {
    pub fn new(node: NodeId, project: ProjectId) -> Self {
        Self {
            node,
            project,
            copy: None,
            level_name: None,
        }
    }

    pub fn with_copy(mut self, copy: impl Into<String>) -> Self {
        self.copy = Some(copy.into());
        self
    }

    pub fn with_level_name(mut self, level_name: impl Into<String>) -> Self {
        self.level_name = Some(level_name.into());
        self
    }

    /// Identity of this target within its task, used as the status key.
    pub fn key(&self) -> TargetKey {
        TargetKey {
            node: self.node.clone(),
            project: self.project.clone(),
            copy: self.copy.clone(),
        }
    }
}

/// Addressable identity of a target: (node, project[, copy]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetKey {
    pub node: NodeId,
    pub project: ProjectId,
    pub copy: Option<String>,
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.copy {
            Some(copy) => write!(f, "{}/{}@{}", self.node, self.project, copy),
            None => write!(f, "{}/{}", self.node, self.project),
        }
    }
}

/// Mutable per-target bookkeeping: the last status, the message that came
/// with it, and who wrote it when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetState {
    pub status: Status,
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Operator,
}

impl TargetState {
    pub fn new(status: Status, message: Option<String>, operator: &Operator) -> Self {
        Self {
            status,
            message,
            updated_at: Utc::now(),
            updated_by: operator.clone(),
        }
    }

    /// Initial state for a target nothing has touched yet.
    pub fn waiting() -> Self {
        Self::new(Status::Waiting, None, &Operator::system())
    }
}
