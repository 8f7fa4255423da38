// ABOUTME: In-process task store over a parking_lot RwLock.
// ABOUTME: Reference implementation; production embedders back the trait with a database.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::task::{DistributionTask, Status, TargetKey, TargetState};
use crate::types::{DistributionId, Operator};

use super::{StoreError, TaskStore};

struct StoredTask {
    task: DistributionTask,
    states: HashMap<TargetKey, TargetState>,
}

/// In-memory [`TaskStore`].
#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<HashMap<DistributionId, StoredTask>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task, seeding every target in `Waiting`.
    /// Replaces any existing task with the same id.
    pub fn insert_task(&self, task: DistributionTask) {
        let states = task
            .targets
            .iter()
            .map(|target| (target.key(), TargetState::waiting()))
            .collect();
        self.tasks
            .write()
            .insert(task.id.clone(), StoredTask { task, states });
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn get_task(&self, id: &DistributionId) -> Result<DistributionTask, StoreError> {
        self.tasks
            .read()
            .get(id)
            .map(|stored| stored.task.clone())
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))
    }

    async fn set_status(
        &self,
        id: &DistributionId,
        target: &TargetKey,
        status: Status,
        message: Option<String>,
        operator: &Operator,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write();
        let stored = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
        let state = stored
            .states
            .get_mut(target)
            .ok_or_else(|| StoreError::TargetNotFound(target.clone()))?;
        *state = TargetState::new(status, message, operator);
        Ok(())
    }

    async fn mark_all_prepared(
        &self,
        id: &DistributionId,
        operator: &Operator,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write();
        let stored = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
        // Single write-lock acquisition makes the sweep atomic to observers.
        for state in stored.states.values_mut() {
            *state = TargetState::new(Status::Prepared, None, operator);
        }
        Ok(())
    }

    async fn target_states(
        &self,
        id: &DistributionId,
    ) -> Result<HashMap<TargetKey, TargetState>, StoreError> {
        self.tasks
            .read()
            .get(id)
            .map(|stored| stored.states.clone())
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{RolloutPolicy, Target};
    use crate::types::{NodeId, ProjectId};

    fn task(id: &str, targets: usize) -> DistributionTask {
        let targets = (0..targets)
            .map(|i| Target::new(NodeId::new(format!("node-{i}")), ProjectId::new("api")))
            .collect();
        DistributionTask::new(DistributionId::new(id), targets, RolloutPolicy::None)
    }

    #[tokio::test]
    async fn get_task_unknown_id() {
        let store = MemoryStore::new();
        let result = store.get_task(&DistributionId::new("nope")).await;
        assert!(matches!(result, Err(StoreError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn targets_start_waiting() {
        let store = MemoryStore::new();
        store.insert_task(task("dist", 2));

        let states = store
            .target_states(&DistributionId::new("dist"))
            .await
            .unwrap();
        assert_eq!(states.len(), 2);
        assert!(states.values().all(|s| s.status == Status::Waiting));
    }

    #[tokio::test]
    async fn set_status_unknown_target() {
        let store = MemoryStore::new();
        store.insert_task(task("dist", 1));

        let ghost = TargetKey {
            node: NodeId::new("ghost"),
            project: ProjectId::new("api"),
            copy: None,
        };
        let result = store
            .set_status(
                &DistributionId::new("dist"),
                &ghost,
                Status::Ok,
                None,
                &Operator::system(),
            )
            .await;
        assert!(matches!(result, Err(StoreError::TargetNotFound(_))));
    }

    #[tokio::test]
    async fn mark_all_prepared_is_idempotent() {
        let store = MemoryStore::new();
        store.insert_task(task("dist", 3));
        let id = DistributionId::new("dist");
        let operator = Operator::new("alice");

        store.mark_all_prepared(&id, &operator).await.unwrap();
        store.mark_all_prepared(&id, &operator).await.unwrap();

        let states = store.target_states(&id).await.unwrap();
        assert_eq!(states.len(), 3);
        assert!(states.values().all(|s| s.status == Status::Prepared));
        assert!(states.values().all(|s| s.updated_by == operator));
    }

    #[tokio::test]
    async fn set_status_records_message_and_operator() {
        let store = MemoryStore::new();
        store.insert_task(task("dist", 1));
        let id = DistributionId::new("dist");
        let key = TargetKey {
            node: NodeId::new("node-0"),
            project: ProjectId::new("api"),
            copy: None,
        };

        store
            .set_status(
                &id,
                &key,
                Status::Failed,
                Some("disk full".to_string()),
                &Operator::new("bob"),
            )
            .await
            .unwrap();

        let states = store.target_states(&id).await.unwrap();
        let state = &states[&key];
        assert_eq!(state.status, Status::Failed);
        assert_eq!(state.message.as_deref(), Some("disk full"));
        assert_eq!(state.updated_by, Operator::new("bob"));
    }
}
