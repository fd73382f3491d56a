//! Core error types for pomotally-core.
//!
//! This module defines the error hierarchy using thiserror. None of these
//! errors ever stop the timer: store failures are logged and dropped by the
//! persistence adapter, and invalid durations are clamped before they reach
//! the engine.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomotally-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport failure talking to a remote store
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote store answered with a non-success status
    #[error("Store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Local SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to open the local database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Document body could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document exists but does not have the expected shape
    #[error("Malformed document '{key}': {message}")]
    Malformed { key: String, message: String },

    /// Invalid endpoint URL
    #[error("Invalid store URL: {0}")]
    Url(#[from] url::ParseError),

    /// Backing storage could not be located
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Store lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,

    /// Blocking database task panicked or was cancelled
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty user identity
    #[error("User identity must not be empty")]
    EmptyIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn panicked_blocking_task_becomes_store_error() {
        let join = tokio::task::spawn_blocking(|| panic!("disk gone")).await;
        let err: StoreError = join.unwrap_err().into();
        assert!(matches!(err, StoreError::Task(_)));
        assert!(err.to_string().starts_with("Store task failed"));
    }

    #[test]
    fn core_error_wraps_store_and_config() {
        let err: CoreError = StoreError::Poisoned.into();
        assert_eq!(err.to_string(), "Store error: Store lock poisoned");
        let err: CoreError = ConfigError::UnknownKey("timer.nope".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown configuration key: timer.nope"
        );
    }
}
