//! Error types for the Cloud Logging client.

use thiserror::Error;

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The service rejected the call or the call failed in transit.
    ///
    /// The status is passed through as received.
    #[error("RPC failed: {0}")]
    Rpc(#[from] tonic::Status),

    /// An entry could not be converted to its wire form.
    #[error("Entry error: {0}")]
    Entry(#[from] EntryError),

    /// An argument was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Sink metadata failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Credentials could not be loaded or a token could not be obtained.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The gRPC channel could not be established.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Configuration was incomplete or unparsable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The default monitored resource could not be detected.
    #[error("Resource detection failed: {0}")]
    ResourceDetection(String),
}

/// Errors that can occur while serializing a log entry.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The payload has a shape the wire format cannot carry.
    #[error("Unsupported payload: {0}")]
    UnsupportedPayload(&'static str),

    /// The entry data could not be serialized to JSON.
    #[error("Failed to serialize entry data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = LoggingError> = std::result::Result<T, E>;
