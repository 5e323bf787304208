//! Error types for checker state backends.

use thiserror::Error;

/// Result type alias for state backend operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while storing or retrieving checker state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("backend root unavailable: {0}")]
    RootUnavailable(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("lock poisoned: {0}")]
    Lock(String),
}
