//! Core error types for taskdeck-core.
//!
//! Only local concerns can fail a task operation: validation of user input
//! and the storage capability. Remote-calendar failures are not errors at
//! this level -- the sync layer swallows them and reports a neutral outcome,
//! so a task write never aborts because the provider was unreachable.

use thiserror::Error;

/// Core error type for taskdeck-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Task or credential storage errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Errors surfaced by a storage capability implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No task with the given id
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Backend-specific failure (keyring, file system, database)
    #[error("Store backend error: {0}")]
    Backend(String),

    /// IO errors from file-backed stores
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation errors for task input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required field missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but out of bounds
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
