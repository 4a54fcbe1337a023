//! Unified error types for hydrowatch
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use crate::alerts::SubjectId;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed input rejected before it reached the rule store
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Rule configuration requested for a subject the directory does not know
    #[error("Subject not found: {0}")]
    SubjectNotFound(SubjectId),

    /// Reading repository failure
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Notification delivery failure
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from input validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Strategy tag is empty or whitespace
    #[error("Strategy tag must not be empty")]
    EmptyStrategyTag,

    /// Time window ends before it starts
    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    /// Invalid value provided
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Errors raised by reading repositories
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Backing store could not be reached
    #[error("Reading repository unavailable: {0}")]
    Unavailable(String),
}

/// Errors from notification sinks and channels
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Channel accepted the message but reported failure
    #[error("Delivery via {channel} to {destination} failed")]
    DeliveryFailed { channel: String, destination: String },

    /// Channel did not answer within the send timeout
    #[error("Channel {channel} timed out after {timeout_ms}ms")]
    Timeout { channel: String, timeout_ms: u64 },

    /// Sink-specific failure
    #[error("Sink {sink} failed: {message}")]
    Sink { sink: String, message: String },

    /// IO error while writing a notification
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
