// ABOUTME: Orchestration engine: scheduler, item executor, and run registry.
// ABOUTME: Decides serial vs. parallel execution and owns cancellation delivery.

mod item;
mod registry;
mod scheduler;

pub use registry::{RunControl, RunHandle, RunRegistry};
pub use scheduler::{RunStarted, Scheduler};
