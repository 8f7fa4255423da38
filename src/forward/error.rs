// ABOUTME: Error types for the node forwarder boundary.
// ABOUTME: Covers connection, timeout, and malformed-response failures.

use thiserror::Error;

/// Errors from sending an operation request to a node agent.
///
/// Timeouts are the forwarder implementation's concern; the orchestration
/// core only sees them as one more way a target fails.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to reach node agent: {0}")]
    Connection(String),

    #[error("node agent request timed out: {0}")]
    Timeout(String),

    #[error("malformed agent response: {0}")]
    MalformedResponse(String),
}
