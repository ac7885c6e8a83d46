// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Invalid run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pool size must be at least 1")]
    ZeroPoolSize,
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Failures reported by [`StandardPool`](crate::StandardPool).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("worker pool is shut down and no longer accepts tasks")]
    ShutDown,
    #[error("{count} task(s) panicked while running in the worker pool")]
    TaskPanicked { count: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Some concurrent unit finished without delivering its result.
    #[error("expected {expected} results but received {received}")]
    LostResults { expected: usize, received: usize },
    /// A buffered deposit found no free slot.
    #[error("result buffer of capacity {capacity} rejected {rejected} deposit(s)")]
    BufferFull { capacity: usize, rejected: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
