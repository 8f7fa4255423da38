// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod operator;

pub use id::{DistributionId, NodeId, ProjectId};
pub use operator::{Operator, SYSTEM_OPERATOR};
