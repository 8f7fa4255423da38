// ABOUTME: Task and status persistence boundary.
// ABOUTME: Callers serialize per-target writes by construction; the store holds no run logic.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::task::{DistributionTask, Status, TargetKey, TargetState};
use crate::types::{DistributionId, Operator};

/// Errors from the task/status store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("distribution task not found: {0}")]
    TaskNotFound(DistributionId),

    #[error("target not found: {0}")]
    TargetNotFound(TargetKey),

    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Storage for distribution tasks and per-target run status.
///
/// The scheduler guarantees at most one executor writes a given target's
/// status during a run, so implementations need no per-target locking
/// beyond their own map consistency.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load a distribution task by id.
    async fn get_task(&self, id: &DistributionId) -> Result<DistributionTask, StoreError>;

    /// Persist a status change for one target, with the message and actor
    /// that produced it.
    async fn set_status(
        &self,
        id: &DistributionId,
        target: &TargetKey,
        status: Status,
        message: Option<String>,
        operator: &Operator,
    ) -> Result<(), StoreError>;

    /// Atomically transition every target of a task to `Prepared`, so
    /// observers see a consistent "run in progress" snapshot rather than a
    /// half-updated previous run. Idempotent.
    async fn mark_all_prepared(
        &self,
        id: &DistributionId,
        operator: &Operator,
    ) -> Result<(), StoreError>;

    /// Snapshot of every target's current state for a task.
    async fn target_states(
        &self,
        id: &DistributionId,
    ) -> Result<HashMap<TargetKey, TargetState>, StoreError>;
}
