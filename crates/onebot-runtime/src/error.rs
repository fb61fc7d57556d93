//! Runtime error types.

use std::time::Duration;

use thiserror::Error;

/// Errors observed by a caller waiting for a correlated reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// No reply arrived within the configured timeout.
    #[error("No echo for action {id} within {timeout:?}")]
    Timeout { id: String, timeout: Duration },

    /// The waiter was dropped before a reply arrived (connection closed or
    /// the send was cancelled).
    #[error("Connection closed while waiting for echo of action {id}")]
    Disconnected { id: String },

    /// The action was built without requesting an echo.
    #[error("Action {id} does not request an echo")]
    EchoNotRequested { id: String },

    /// An action with the same id is already pending.
    #[error("Action {id} is already pending")]
    Duplicate { id: String },

    /// Too many actions are pending.
    #[error("Too many pending actions (limit {limit})")]
    Full { limit: usize },
}

/// Result type for correlation operations.
pub type CorrelationResult<T> = Result<T, CorrelationError>;
