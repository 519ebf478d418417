//! Error types for the board engine

use crate::remote::RemoteError;
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur in board operations
#[derive(Debug, Error)]
pub enum BoardError {
    /// Caller supplied a value that fails local validation (blank title, bad date)
    #[error("invalid value for {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A column with this title (or id) already exists
    #[error("column already exists: {title}")]
    DuplicateColumn { title: String },

    /// The board must keep at least one column
    #[error("cannot remove '{id}': it is the last column")]
    LastColumn { id: String },

    /// Task or column id unknown locally
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Target status is not a registered column
    #[error("not a column on this board: {id}")]
    InvalidColumn { id: String },

    /// The persistence service rejected or failed the call
    #[error("remote {operation} failed: {source}")]
    RemoteFailure {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    /// Undo requested with nothing recorded
    #[error("nothing to undo")]
    EmptyHistory,

    /// No owner session; `initialize` or `refresh` has not run
    #[error("no owner session - initialize the board first")]
    NoSession,
}

impl BoardError {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error for a task
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "task".into(),
            id: id.into(),
        }
    }

    /// Create a not found error for a column
    pub fn column_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "column".into(),
            id: id.into(),
        }
    }

    /// Wrap a remote error with the operation that produced it
    pub fn remote(operation: &'static str, source: RemoteError) -> Self {
        Self::RemoteFailure { operation, source }
    }

    /// True for errors raised before any remote call was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::DuplicateColumn { .. }
                | Self::LastColumn { .. }
                | Self::NotFound { .. }
                | Self::InvalidColumn { .. }
                | Self::NoSession
        )
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteFailure { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
