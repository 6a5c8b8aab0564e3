//! Core error types for halcyon-core.
//!
//! Every failure in this crate is non-fatal: persistence and fetch errors
//! degrade to "keep the last known good state" and are reported, never
//! thrown through the consumer-facing accessors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for halcyon-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Prediction fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value store errors.
///
/// Read failures are treated as a cold start; write failures are logged
/// and the in-memory value is retained.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Read failed for a key
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Write failed for a key
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },
}

/// Prediction fetch errors.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No endpoint configured -- remote fetch capability is absent
    #[error("Prediction endpoint not configured")]
    NotConfigured,

    /// Endpoint string could not be parsed as a URL
    #[error("Invalid prediction endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Prediction service returned status {status}")]
    Status { status: u16 },

    /// Response body did not match the expected shape
    #[error("Failed to decode prediction: {0}")]
    Decode(String),
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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
