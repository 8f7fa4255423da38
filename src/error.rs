// ABOUTME: Application-wide error types for diadosi.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

use crate::store::StoreError;
use crate::task::UnknownPolicy;
use crate::types::DistributionId;

/// Task-level failures surfaced to the caller of `start_run`.
///
/// Per-target failures never appear here: they are contained by the item
/// executor and observed through target statuses instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("distribution task not found: {0}")]
    NotFound(DistributionId),

    #[error("distribution {0} already has an active run")]
    AlreadyRunning(DistributionId),

    #[error("configuration error: {0}")]
    Configuration(#[from] UnknownPolicy),

    #[error(transparent)]
    Store(StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TaskNotFound(id) => Error::NotFound(id),
            other => Error::Store(other),
        }
    }
}
