// ABOUTME: Executes one target's push/restart step and reports a terminal status.
// ABOUTME: Transport and persistence failures are contained here, never re-thrown.

use std::path::PathBuf;
use std::sync::Arc;

use crate::forward::{NodeForwarder, UploadRequest};
use crate::store::TaskStore;
use crate::task::{DistributionTask, RolloutPolicy, Status, Target};
use crate::types::Operator;

/// Everything a run's executors share: collaborators, the task, and the
/// caller-supplied artifact parameters. Read-only for the whole run.
pub(crate) struct RunContext<S, F> {
    pub store: Arc<S>,
    pub forwarder: Arc<F>,
    pub task: DistributionTask,
    pub policy: RolloutPolicy,
    pub artifact: PathBuf,
    pub operator: Operator,
    pub unzip: bool,
    pub strip_components: u32,
}

/// One target's execution unit. The scheduler dispatches at most one
/// `ItemRun` per target per run, which is what makes the target's status
/// record safe to write without locking.
pub(crate) struct ItemRun<S, F> {
    ctx: Arc<RunContext<S, F>>,
    target: Target,
}

impl<S: TaskStore, F: NodeForwarder> ItemRun<S, F> {
    pub(crate) fn new(ctx: Arc<RunContext<S, F>>, target: Target) -> Self {
        Self { ctx, target }
    }

    /// Run the deployment step for this target and return its terminal
    /// status. Never fails: remote and persistence errors become `Failed`
    /// status or a logged warning, so one target cannot corrupt the
    /// bookkeeping of its siblings.
    pub(crate) async fn run(&self) -> Status {
        self.set_status(Status::Running, None).await;

        let request = self.build_request();
        tracing::debug!(
            dest = %self.target.key(),
            node = %self.target.node,
            "uploading artifact to node agent"
        );

        let (status, message) = match self.ctx.forwarder.upload(&self.target.node, &request).await {
            Ok(response) if response.is_success() => (Status::Ok, response.message),
            Ok(response) => {
                tracing::warn!(
                    dest = %self.target.key(),
                    code = response.code,
                    "node agent rejected upload: {}",
                    response.message
                );
                (Status::Failed, response.message)
            }
            Err(err) => {
                tracing::warn!(dest = %self.target.key(), "upload failed: {err}");
                (Status::Failed, err.to_string())
            }
        };

        self.set_status(status, Some(message)).await;
        status
    }

    /// Build the agent request from the task, target, and run parameters.
    fn build_request(&self) -> UploadRequest {
        let task = &self.ctx.task;
        UploadRequest {
            file: self.ctx.artifact.clone(),
            project: self.target.project.clone(),
            level_name: self.target.level_name.clone(),
            unzip: self.ctx.unzip,
            strip_components: self.ctx.unzip.then_some(self.ctx.strip_components),
            clear_old: task.clear_old,
            after_action: self.ctx.policy.after_action(),
            close_first: task.close_first,
            // Only ordered rollouts pace their steps; the agent gets the
            // delay so it can reason about timing on its side too.
            sleep_time: self
                .ctx
                .policy
                .is_ordered()
                .then(|| task.interval.as_secs()),
        }
    }

    /// Persist a status change. A write failure is logged and swallowed:
    /// the remote side has already acted and there is nothing to roll back.
    async fn set_status(&self, status: Status, message: Option<String>) {
        if let Err(err) = self
            .ctx
            .store
            .set_status(
                &self.ctx.task.id,
                &self.target.key(),
                status,
                message,
                &self.ctx.operator,
            )
            .await
        {
            tracing::error!(
                dest = %self.target.key(),
                %status,
                "failed to persist target status: {err}"
            );
        }
    }
}
