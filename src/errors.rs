//! Error types for the connection pool

use std::time::Duration;
use thiserror::Error;

/// Reasons a [`PoolConfiguration`](crate::PoolConfiguration) is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid capacity settings: min_size={min_size}, max_idle={max_idle}, max_size={max_size} (need min_size <= max_idle <= max_size)")]
    InvalidCapacity {
        min_size: usize,
        max_idle: usize,
        max_size: usize,
    },

    #[error("invalid factory settings: no factory configured")]
    MissingFactory,

    #[error("invalid closer settings: no closer configured")]
    MissingCloser,
}

/// Errors returned by [`ConnectionPool`](crate::ConnectionPool) operations.
///
/// `E` is the error type of the caller-supplied factory, closer and prober;
/// their failures are carried through unchanged so callers can tell a
/// broken resource apart from an exhausted or closed pool.
#[derive(Error, Debug, Clone)]
pub enum PoolError<E> {
    #[error("maximum number of open connections reached")]
    MaxActiveReached,

    #[error("pool is closed")]
    Closed,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("factory is not able to fill the pool: {0}")]
    Fill(#[source] E),

    #[error(transparent)]
    Resource(E),

    #[error("timed out after {0:?} waiting for a connection")]
    Timeout(Duration),
}

impl<E> PoolError<E> {
    /// Whether retrying after a backoff delay can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::MaxActiveReached)
    }
}

pub type PoolResult<T, E> = Result<T, PoolError<E>>;
