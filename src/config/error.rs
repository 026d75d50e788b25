//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid socket address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid log format '{0}' (expected 'pretty' or 'json')")]
    InvalidLogFormat(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool size must be between 1 and 100")]
    InvalidPoolSize,

    #[error("Storage timeout must be between 1 and 60000 ms")]
    InvalidStorageTimeout,

    #[error("Invalid webhook URL format")]
    InvalidWebhookUrl,

    #[error("Delivery max_attempts must be between 1 and 10")]
    InvalidMaxAttempts,

    #[error("Delivery backoff is invalid: initial must not exceed max")]
    InvalidBackoff,

    #[error("Signing secret must be at least 16 characters")]
    WeakSigningSecret,
}
