//! Error types for the metastore event reader

use std::io;
use thiserror::Error;

use crate::catalog::CatalogLookupError;

/// Result type for reader operations
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Errors surfaced by [`crate::MetaStoreEventReader::read`] and friends
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Queue transport failed or delivered an undecodable payload
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// Source catalog could not classify a table alteration
    #[error(transparent)]
    CatalogLookup(#[from] CatalogLookupError),

    /// Upstream producer sent an event that violates its own contract
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Releasing the queue resource failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reader was already closed
    #[error("Reader is closed")]
    Closed,
}

impl ReaderError {
    /// Check if the failure came from the queue transport rather than a single event
    ///
    /// Transport failures say nothing about the event stream; per-event failures
    /// (catalog lookup, malformed or undecodable event) mean the current message
    /// was skipped and not emitted.
    pub fn is_transport(&self) -> bool {
        match self {
            ReaderError::Messaging(e) => e.is_transport(),
            ReaderError::Io(_) => true,
            ReaderError::CatalogLookup(_)
            | ReaderError::MalformedEvent(_)
            | ReaderError::Closed => false,
        }
    }
}

/// Errors raised by [`crate::MessageReader`] implementations
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// Payload is not a valid listener event
    #[error("Failed to decode listener event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Empty payload at {topic}[{partition}]@{offset}")]
    EmptyPayload {
        topic: String,
        partition: i32,
        offset: i64,
    },

    /// Message lacks a transport property needed to acknowledge it
    #[error("Missing message property: {0}")]
    MissingProperty(&'static str),

    #[error("Invalid message property {name}: {value}")]
    InvalidProperty { name: &'static str, value: String },

    /// Transport was closed and can no longer deliver or acknowledge messages
    #[error("Message reader is closed")]
    Closed,
}

impl MessagingError {
    /// Check if the queue itself failed, as opposed to one message being unreadable
    pub fn is_transport(&self) -> bool {
        !matches!(
            self,
            MessagingError::Decode(_) | MessagingError::EmptyPayload { .. }
        )
    }
}

/// Errors loading [`crate::ReaderConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
