// ABOUTME: Library root for diadosi - fleet deployment orchestration.
// ABOUTME: Pushes artifacts to node agents under rollout policies with per-target status tracking.

pub mod dispatch;
pub mod error;
pub mod forward;
pub mod store;
pub mod task;
pub mod types;
