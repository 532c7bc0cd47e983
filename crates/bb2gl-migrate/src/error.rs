//! Error types for migration operations.

use thiserror::Error;

/// Migration-specific errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// GitLab rejected the token of a handle.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Target project is not visible to the default handle.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// GitLab answered with a non-success status.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Network error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The export file parsed but violates a bundle invariant.
    #[error("Invalid import bundle: {0}")]
    InvalidBundle(String),

    /// No credential handle is registered at all.
    #[error("No GitLab credentials registered")]
    NoCredentials,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration source error.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;
