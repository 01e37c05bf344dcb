//! Error taxonomy for the pipeline.
//!
//! Failures that belong to a single unit of work (one URL, one chain) are
//! modelled here so callers can branch on the kind instead of matching on
//! message text. Routing signals live in [`crate::router::RouteSignal`]
//! because they are not errors from the caller's point of view.

use thiserror::Error;

/// Object storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Any other storage failure (network, permissions, corrupt payload).
    #[error("storage I/O error for {bucket}/{key}: {message}")]
    Io {
        bucket: String,
        key: String,
        message: String,
    },
}

impl StorageError {
    pub fn io(bucket: &str, key: &str, message: impl Into<String>) -> Self {
        StorageError::Io {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(bucket: &str, key: &str) -> Self {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// A content parser rejected the fetched chain.
#[derive(Debug, Error)]
#[error("parse failed: {0}")]
pub struct ParseError(pub String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError(message.into())
    }
}

/// Appending to a chain aggregator failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("aggregator capacity of {capacity} items exceeded (object key {object_key})")]
    CapacityExceeded { capacity: usize, object_key: String },
}

/// A bulk upsert did not fully apply.
#[derive(Debug, Error)]
pub enum BulkWriteError {
    /// The whole batch failed (connectivity, timeout, transaction failure).
    #[error("bulk write failed: {0}")]
    Batch(String),

    /// Some operations failed; the others were applied.
    #[error("bulk write partially failed: {} of {} operations failed", failures.len(), attempted)]
    Partial {
        attempted: usize,
        failures: Vec<OperationFailure>,
    },
}

/// One failed operation inside an unordered bulk write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    /// Position of the operation in the submitted batch.
    pub index: usize,
    pub url: String,
    pub message: String,
}

/// A single upsert failed.
#[derive(Debug, Error)]
#[error("record store error: {0}")]
pub struct RecordStoreError(pub String);
