use thiserror::Error;

/// Errors that can occur when configuring or querying the LSH index.
///
/// Insertion and candidate retrieval never fail on the generic index; errors
/// come from invalid construction parameters, from output buffers of
/// inconsistent length, and from the checked `try_*` operations of
/// [`VectorLshIndex`](crate::config::VectorLshIndex).
#[derive(Debug, Error)]
pub enum LshError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension must be greater than 0")]
    ZeroDimension,

    #[error("num_hashes must be between 1 and 64, got {0}")]
    InvalidNumHashes(usize),

    #[error("index needs at least one hash table")]
    NoTables,

    #[error("output length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[cfg(feature = "parallel")]
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

/// A specialized Result type for LSH index operations.
pub type Result<T> = std::result::Result<T, LshError>;
