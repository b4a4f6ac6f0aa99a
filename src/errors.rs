use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PoolError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// A worker was executing a task when `stop` was called.
    #[error("pool is busy")]
    Busy,

    #[error("pool is stopped")]
    Stopped,

    #[error("timed out waiting for a result")]
    Timeout,

    #[error("result channel closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, PoolError>;
