// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for helpdesk operations

use thiserror::Error;

/// Errors that can occur in event store, projection storage and configuration
#[derive(Debug, Error)]
pub enum HelpdeskError {
    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Optimistic concurrency check failed on append
    #[error("Concurrency error: {0}")]
    ConcurrencyError(String),

    /// Projection storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic helpdesk error
    #[error("Helpdesk error: {0}")]
    Generic(String),
}

/// Result type for helpdesk operations
pub type HelpdeskResult<T> = Result<T, HelpdeskError>;

impl From<async_nats::Error> for HelpdeskError {
    fn from(err: async_nats::Error) -> Self {
        HelpdeskError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for HelpdeskError {
    fn from(err: serde_json::Error) -> Self {
        HelpdeskError::Serialization(err.to_string())
    }
}
