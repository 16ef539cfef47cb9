//! Error types for TASKBOARD.

use thiserror::Error;

/// Common error type for TASKBOARD.
#[derive(Error, Debug)]
pub enum TaskboardError {
    /// Missing board, block or member, or no membership of any kind.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed request, such as a batch with mismatched paired arrays
    /// or a block that points at a board outside its batch.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A title or similar field exceeds its maximum length.
    #[error("size limit exceeded: {0}")]
    SizeLimitExceeded(String),

    /// The caller decided the user may not perform the action.
    ///
    /// The core only answers permission questions with booleans; this
    /// variant exists so callers can report their decision in the same type.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Database error.
    ///
    /// Wraps failures of the underlying store, including write conflicts and
    /// aborted transactions. Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// The host platform could not answer a directory lookup.
    #[error("host platform error: {0}")]
    Host(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TaskboardError {
    /// Shorthand for a `NotFound` error naming the missing entity.
    pub fn not_found(what: impl Into<String>) -> Self {
        TaskboardError::NotFound(what.into())
    }

    /// Shorthand for a `BadRequest` error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        TaskboardError::BadRequest(msg.into())
    }

    /// Check whether this error means "nothing there".
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskboardError::NotFound(_))
    }
}

impl From<sqlx::Error> for TaskboardError {
    fn from(e: sqlx::Error) -> Self {
        TaskboardError::Database(e.to_string())
    }
}

/// Result type alias for TASKBOARD operations.
pub type Result<T> = std::result::Result<T, TaskboardError>;
