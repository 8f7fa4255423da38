// ABOUTME: Boundary trait for delivering operation requests to node agents.
// ABOUTME: The orchestration core only depends on the request/response contract.

mod error;
mod request;

pub use error::ForwardError;
pub use request::{AgentResponse, SUCCESS_CODE, UploadRequest};

use crate::types::NodeId;
use async_trait::async_trait;

/// Sends an operation request to a specific node's agent.
///
/// Implementations own transport concerns end to end: connection pooling,
/// per-call timeouts, and the byte-level framing of the artifact upload.
/// The orchestrator only interprets the structured response.
#[async_trait]
pub trait NodeForwarder: Send + Sync {
    /// Deliver the artifact described by `request` to `node` and return the
    /// agent's response.
    async fn upload(
        &self,
        node: &NodeId,
        request: &UploadRequest,
    ) -> Result<AgentResponse, ForwardError>;
}
