//! Error types for the storage layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Unified error type for the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The host has unloaded the execution context; the backend must not
    /// be touched.
    #[error("Execution context is no longer valid")]
    ContextInvalid,

    /// The backend adapter rejected a call
    #[error("Backend I/O failure: {0}")]
    Backend(String),

    /// Invalid request data, rejected before any I/O
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A stored record could not be decoded
    #[error("Record decode failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the storage layer.
pub type Result<T> = std::result::Result<T, StoreError>;
