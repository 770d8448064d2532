//! Error types for the annotation mapper
//!
//! This module defines the errors surfaced by the mapping pipeline and
//! its configuration layer, using `thiserror` for ergonomic error handling.

use crate::kafka::ProducerError;
use thiserror::Error;

/// Main error type for annotation mapper operations
///
/// A whitelist mismatch and an unmapped predicate are not errors; they are
/// reported through diagnostics. Every variant here aborts the handling of
/// a single message and is returned to the consumer loop.
#[derive(Error, Debug)]
pub enum MapperError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inbound body could not be decoded into a publish event
    #[error("Cannot unmarshal message body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Outbound envelope could not be serialized
    #[error("Error marshalling the concept annotations: {0}")]
    Encode(#[source] serde_json::Error),

    /// Outbound message could not be handed to the producer
    #[error("Error sending concept annotation to queue: {0}")]
    Dispatch(#[from] ProducerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for annotation mapper binaries and setup code
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
