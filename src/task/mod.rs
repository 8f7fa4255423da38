// ABOUTME: Distribution task data model, rollout policies, and target status.
// ABOUTME: Everything the scheduler reads to plan a run.

mod model;
mod policy;
mod status;

pub use model::{DEFAULT_INTERVAL_SECS, DistributionTask, Target, TargetKey, TargetState};
pub use policy::{AfterAction, RolloutPolicy, UnknownPolicy};
pub use status::Status;
