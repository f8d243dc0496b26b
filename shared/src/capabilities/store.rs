use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the shell for a backend document read or write.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response to {operation}")]
    UnexpectedOutput { operation: String },
}
