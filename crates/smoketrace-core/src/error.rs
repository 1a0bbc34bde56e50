//! Core error types for smoketrace-core.
//!
//! Remote failures never reach the user on their own: the completion path
//! downgrades them to [`crate::store::BestEffort::Ignored`]. These types are
//! what the fallible surfaces (configuration, explicit store queries) return.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for smoketrace-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote counter/presence store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

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

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Remote store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    /// Database URL missing or malformed
    #[error("Store not configured: {0}")]
    NotConfigured(String),
}

/// Interstitial surface errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterstitialError {
    /// The platform has no interstitial support
    #[error("interstitials are not supported on this platform")]
    Unsupported,
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A value must be strictly positive
    #[error("'{field}' must be greater than zero")]
    NotPositive { field: String },

    /// A lower bound is not below its upper bound
    #[error("'{lower}' ({lower_value}) must be less than '{upper}' ({upper_value})")]
    InvertedRange {
        lower: String,
        lower_value: u64,
        upper: String,
        upper_value: u64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Config key the failure is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::NotPositive { field }
            | ValidationError::InvalidValue { field, .. } => field,
            ValidationError::InvertedRange { lower, .. } => lower,
        }
    }
}

impl From<url::ParseError> for StoreError {
    fn from(err: url::ParseError) -> Self {
        StoreError::NotConfigured(err.to_string())
    }
}
