// ABOUTME: Rollout scheduler: plans a run per policy and dispatches item executors.
// ABOUTME: Ordered policies run sequentially with inter-step delays; parallel ones use a bounded pool.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

use crate::error::{Error, Result};
use crate::forward::NodeForwarder;
use crate::store::TaskStore;
use crate::task::{RolloutPolicy, Status, Target};
use crate::types::{DistributionId, Operator};

use super::item::{ItemRun, RunContext};
use super::registry::{RunControl, RunHandle, RunRegistry};

/// A run accepted by the scheduler. `start_run` returns once the workers
/// are launched; awaiting this handle waits for the run itself.
#[derive(Debug)]
pub struct RunStarted {
    supervisor: JoinHandle<()>,
}

impl RunStarted {
    /// Wait until every target has reached a terminal status and the run's
    /// registry entry has been removed.
    pub async fn wait(self) {
        // The supervisor only aborts if the runtime shuts down under it.
        let _ = self.supervisor.await;
    }
}

/// Orchestrates distribution runs: one scheduler instance serves the whole
/// process, sharing its registry across runs.
pub struct Scheduler<S, F> {
    store: Arc<S>,
    forwarder: Arc<F>,
    registry: Arc<RunRegistry>,
    parallelism: usize,
}

impl<S, F> Scheduler<S, F>
where
    S: TaskStore + 'static,
    F: NodeForwarder + 'static,
{
    pub fn new(store: Arc<S>, forwarder: Arc<F>) -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            store,
            forwarder,
            registry: Arc::new(RunRegistry::new()),
            parallelism,
        }
    }

    /// Cap the parallel worker pool below host parallelism.
    pub fn with_parallelism(mut self, limit: usize) -> Self {
        self.parallelism = limit.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// Start an asynchronous distribution run.
    ///
    /// Resolves the task, validates its policy, marks every target
    /// `Prepared`, registers a cancellable run handle under the
    /// distribution id, and launches the executors. Returns once the work
    /// is dispatched; per-target outcomes are observed through the store.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Configuration` for an unsupported
    /// policy code, `AlreadyRunning` when the id already has a live run.
    pub async fn start_run(
        &self,
        id: &DistributionId,
        artifact: impl Into<PathBuf>,
        operator: Operator,
        unzip: bool,
        strip_components: u32,
    ) -> Result<RunStarted> {
        let task = self.store.get_task(id).await?;
        let policy = task.policy()?;

        let handle = Arc::new(RunHandle::new());
        let control: Arc<dyn RunControl> = handle.clone();
        if !self.registry.try_register(id.clone(), control.clone()) {
            return Err(Error::AlreadyRunning(id.clone()));
        }

        // Prepared-sweep happens after registration so a racing start_run
        // for the same id cannot interleave its own sweep with ours.
        if let Err(err) = self.store.mark_all_prepared(id, &operator).await {
            self.registry.remove_entry(id, &control);
            return Err(err.into());
        }

        let ctx = Arc::new(RunContext {
            store: self.store.clone(),
            forwarder: self.forwarder.clone(),
            task,
            policy,
            artifact: artifact.into(),
            operator,
            unzip,
            strip_components,
        });

        tracing::debug!(%id, ?policy, targets = ctx.task.targets.len(), "starting distribution run");

        let registry = self.registry.clone();
        let run_id = id.clone();
        let parallelism = self.parallelism;
        let supervisor = tokio::spawn(async move {
            if policy.is_ordered() {
                run_ordered(ctx, handle.clone()).await;
            } else {
                run_parallel(ctx, handle.clone(), parallelism).await;
            }
            // Final cleanup happens exactly once, here, after all submitted
            // work has finished or been skipped via cancellation.
            registry.remove_entry(&run_id, &control);
            tracing::debug!(id = %run_id, "distribution run finished");
        });

        Ok(RunStarted { supervisor })
    }

    /// Cancel the run registered under `id`. Best-effort and cooperative:
    /// executors mid-remote-call finish, queued ones are skipped and marked
    /// `Cancelled`. Returns `false` when no run is registered, which is not
    /// an error (the run already finished or never started).
    pub fn cancel(&self, id: &DistributionId) -> bool {
        self.registry.cancel(id)
    }
}

/// Sequential loop for ordered policies.
///
/// Each step runs to completion before the next is dispatched. Between
/// steps the loop sleeps the task's interval so a freshly restarted process
/// can begin serving before a dependent target rolls; the delay is a
/// deliberately simple readiness heuristic, not a health check. Strict mode
/// converts the first non-`Ok` step into a fatal-cancel that skips every
/// remaining target.
async fn run_ordered<S, F>(ctx: Arc<RunContext<S, F>>, handle: Arc<RunHandle>)
where
    S: TaskStore,
    F: NodeForwarder,
{
    let targets = ctx.task.targets.clone();
    let total = targets.len();
    let mut fatal: Option<String> = None;

    for (index, target) in targets.into_iter().enumerate() {
        if handle.is_cancelled() {
            mark_cancelled(&ctx, &target, "distribution cancelled".to_string()).await;
            continue;
        }
        if let Some(cause) = &fatal {
            mark_cancelled(&ctx, &target, cause.clone()).await;
            continue;
        }

        let key = target.key();
        let status = ItemRun::new(ctx.clone(), target).run().await;

        if ctx.policy == RolloutPolicy::OrderedRestartStrict && status != Status::Ok {
            fatal = Some(format!(
                "previous target {key} failed, remaining targets cancelled"
            ));
            continue;
        }

        // No sleep after the final target, and none when the remaining
        // targets will be cancelled without a remote call anyway.
        if index + 1 < total && !handle.is_cancelled() {
            tokio::select! {
                _ = tokio::time::sleep(ctx.task.interval) => {}
                _ = handle.cancelled() => {}
            }
        }
    }
}

/// Bounded worker pool for parallel policies: at most
/// `min(target count, parallelism)` executors in flight at once.
async fn run_parallel<S, F>(ctx: Arc<RunContext<S, F>>, handle: Arc<RunHandle>, parallelism: usize)
where
    S: TaskStore + 'static,
    F: NodeForwarder + 'static,
{
    let limit = parallelism.min(ctx.task.targets.len()).max(1);
    let pool = Arc::new(Semaphore::new(limit));
    let mut workers = JoinSet::new();

    for target in ctx.task.targets.clone() {
        let ctx = ctx.clone();
        let handle = handle.clone();
        let pool = pool.clone();
        workers.spawn(async move {
            let _permit = pool.acquire_owned().await.expect("pool semaphore never closed");
            if handle.is_cancelled() {
                mark_cancelled(&ctx, &target, "distribution cancelled".to_string()).await;
                return;
            }
            ItemRun::new(ctx, target).run().await;
        });
    }

    while workers.join_next().await.is_some() {}
}

/// Mark a skipped target `Cancelled` without issuing a remote call.
async fn mark_cancelled<S, F>(ctx: &RunContext<S, F>, target: &Target, message: String)
where
    S: TaskStore,
    F: NodeForwarder,
{
    if let Err(err) = ctx
        .store
        .set_status(
            &ctx.task.id,
            &target.key(),
            Status::Cancelled,
            Some(message),
            &ctx.operator,
        )
        .await
    {
        tracing::error!(
            dest = %target.key(),
            "failed to persist cancelled status: {err}"
        );
    }
}
