//! Error types for the task board.
//!
//! Validation failures are ordinary, typed outcomes. Only `Storage` signals
//! something exceptional (an unreadable or unwritable data file).

use std::path::PathBuf;

use thiserror::Error;

use crate::task::TaskId;
use crate::users::UserId;

/// Failures reading or writing a JSON data file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by [`crate::store::TaskStore`] operations.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Title is empty or whitespace only.
    #[error("Task title cannot be empty")]
    InvalidTitle,

    /// Status text is outside the four board columns.
    #[error("Invalid status '{0}': must be one of To-Do, In Progress, Waiting Review, Finished")]
    InvalidStatus(String),

    /// Due date is not a real calendar date in `YYYY-MM-DD` form.
    #[error("Invalid due date '{0}': expected YYYY-MM-DD")]
    InvalidDueDateFormat(String),

    #[error("User {0} does not exist")]
    UnknownUser(UserId),

    #[error("Task {0} not found")]
    TaskNotFound(TaskId),

    /// The id counter has reached its upper bound.
    #[error("No task ids left to allocate")]
    IdsExhausted,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised by the user directory.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} is already registered")]
    DuplicateUser(UserId),

    #[error("User name cannot be empty")]
    InvalidName,

    #[error("User {0} does not exist")]
    UnknownUser(UserId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
