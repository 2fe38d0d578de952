//! Engine error types.

use std::time::Duration;

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur in the streak engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage failure. During `record_activity` this is never swallowed:
    /// the caller decides whether the triggering activity creation should
    /// be surfaced as failed or the streak update retried.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Missing or malformed caller input (user id, pagination).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation exceeded its deadline. The outcome is unknown; the
    /// store's durable state is the source of truth, not this error.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
