//! Error types for fixalloc

use thiserror::Error;

use crate::memory::{JobId, PartitionId};

/// Main error type for fixalloc
#[derive(Error, Debug)]
pub enum FixallocError {
    /// A size or other argument was out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// Partition not found
    #[error("Partition not found: {0}")]
    PartitionNotFound(PartitionId),

    /// Job is not currently allocated to a partition
    #[error("Job {0} is not allocated")]
    NotAllocated(JobId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scenario error
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for fixalloc operations
pub type FixallocResult<T> = Result<T, FixallocError>;

impl From<serde_json::Error> for FixallocError {
    fn from(err: serde_json::Error) -> Self {
        FixallocError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for FixallocError {
    fn from(err: toml::de::Error) -> Self {
        FixallocError::Config(err.to_string())
    }
}
