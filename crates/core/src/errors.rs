//! Error types shared by every Bistro crate.

use thiserror::Error;

/// Result type alias for Bistro operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Retry policy class for storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Storage-level failures, backend agnostic.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The store could not be reached (connect refused, pool exhausted on connect).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A failure expected to clear on its own (dropped connection, serialization failure).
    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("At least {required} tags are required, got {actual}")]
    NotEnoughTags { required: usize, actual: usize },

    #[error("Rating must be between {min} and {max}, got {actual}")]
    RatingOutOfRange { min: i32, max: i32, actual: i32 },

    #[error("Field '{0}' must not be empty")]
    MissingField(&'static str),

    #[error("{0} is already registered")]
    AlreadyRegistered(&'static str),
}

impl Error {
    /// Classify error for retry policy.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Database(DatabaseError::ConnectionFailed(_))
            | Self::Database(DatabaseError::Transient(_)) => RetryClass::Retryable,
            _ => RetryClass::Permanent,
        }
    }

    /// True when the error means the store itself is unreachable.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Database(DatabaseError::ConnectionFailed(_)))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Database(DatabaseError::NotFound(message.into()))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Database(DatabaseError::Internal(message.into()))
    }
}
