// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted mock forwarder and task fixtures for integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;
use tokio::sync::Semaphore;

use diadosi::forward::{AgentResponse, ForwardError, NodeForwarder, UploadRequest};
use diadosi::store::MemoryStore;
use diadosi::task::{DistributionTask, RolloutPolicy, Target};
use diadosi::types::{DistributionId, NodeId, ProjectId};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("diadosi=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Scripted outcome for one node's uploads.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Outcome {
    Success,
    Failure(i32, String),
    Transport(String),
}

/// One recorded upload call.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub node: String,
    pub request: UploadRequest,
    pub at: tokio::time::Instant,
}

/// Mock node forwarder: scripted per-node outcomes, recorded calls, and an
/// optional gate the test controls to hold uploads open.
pub struct MockForwarder {
    outcomes: Mutex<HashMap<String, Outcome>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl MockForwarder {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            gate: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Script the outcome for uploads to a given node. Unscripted nodes
    /// succeed.
    pub fn set_outcome(&self, node: &str, outcome: Outcome) {
        self.outcomes.lock().insert(node.to_string(), outcome);
    }

    /// Sleep this long inside every upload before responding.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Require a permit from `gate` before any upload returns. Start the
    /// semaphore at zero permits and add them to release calls one by one.
    pub fn set_gate(&self, gate: Arc<Semaphore>) {
        *self.gate.lock() = Some(gate);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn nodes_called(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.node.clone()).collect()
    }

    /// Highest number of uploads observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeForwarder for MockForwarder {
    async fn upload(
        &self,
        node: &NodeId,
        request: &UploadRequest,
    ) -> Result<AgentResponse, ForwardError> {
        self.calls.lock().push(RecordedCall {
            node: node.as_str().to_string(),
            request: request.clone(),
            at: tokio::time::Instant::now(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let outcome = self
            .outcomes
            .lock()
            .get(node.as_str())
            .cloned()
            .unwrap_or(Outcome::Success);
        match outcome {
            Outcome::Success => Ok(AgentResponse::success("upload ok")),
            Outcome::Failure(code, message) => Ok(AgentResponse::failure(code, message)),
            Outcome::Transport(message) => Err(ForwardError::Connection(message)),
        }
    }
}

/// A task whose targets live on nodes `node-0` .. `node-{count-1}`, all
/// deploying the same project.
#[allow(dead_code)]
pub fn task(id: &str, node_count: usize, policy: RolloutPolicy) -> DistributionTask {
    let targets = (0..node_count)
        .map(|i| Target::new(NodeId::new(format!("node-{i}")), ProjectId::new("api")))
        .collect();
    DistributionTask::new(DistributionId::new(id), targets, policy)
}

/// A store seeded with the given task.
#[allow(dead_code)]
pub fn store_with(task: DistributionTask) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_task(task);
    store
}

/// Current state of the fixture target living on `node`.
#[allow(dead_code)]
pub async fn state_of(store: &MemoryStore, id: &str, node: &str) -> diadosi::task::TargetState {
    use diadosi::store::TaskStore;
    use diadosi::task::TargetKey;

    let key = TargetKey {
        node: NodeId::new(node),
        project: ProjectId::new("api"),
        copy: None,
    };
    let states = store
        .target_states(&DistributionId::new(id))
        .await
        .expect("task should exist");
    states.get(&key).expect("target should exist").clone()
}
