//! Remote persistence boundary
//!
//! The engine never talks to a transport directly; it calls a [`RemoteStore`].
//! Two implementations ship with the crate:
//!
//! - [`GraphqlRemote`] - HTTP GraphQL client with bearer auth, timeout and retry
//! - [`InMemoryRemote`] - in-process store with failure injection, used by tests
//!   and offline sessions

mod graphql;
mod memory;
mod wire;

pub use graphql::GraphqlRemote;
pub use memory::{InMemoryRemote, RemoteCall};

use crate::types::{ColumnId, OwnerId, Task, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Create request as sent to the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<ColumnId>,
    pub due_date: Option<DateTime<Utc>>,
    pub owner_id: OwnerId,
}

/// Partial update as sent to the remote store. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ColumnId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// A patch that only changes the status
    pub fn status(status: ColumnId) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }

    /// Apply the patch to a task in place (used by in-process stores)
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
    }
}

/// Errors reported by a remote store
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (connect, timeout, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The GraphQL response carried errors
    #[error("GraphQL error: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// The response had no payload for the requested field
    #[error("response missing `{field}`")]
    MissingData { field: String },

    /// The payload could not be turned into a task
    #[error("malformed response: {message}")]
    Decode { message: String },

    /// The remote has no task with this id
    #[error("task not found on remote: {id}")]
    NotFound { id: String },

    /// The remote refused the request
    #[error("remote rejected request: {message}")]
    Rejected { message: String },
}

impl RemoteError {
    /// Whether repeating the request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the request is known not to have reached the server
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect())
    }
}

/// The persistence service consumed by the engine.
///
/// Each call is applied atomically by the remote and either returns a fully
/// materialized task or an error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All tasks belonging to `owner`
    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, RemoteError>;

    /// A single task by id
    async fn get_task(&self, id: &TaskId) -> Result<Task, RemoteError>;

    /// Create a task; the remote assigns id and timestamps
    async fn create_task(&self, input: &NewTask) -> Result<Task, RemoteError>;

    /// Change some fields of a task, returning the full updated task
    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteError>;

    /// Delete a task, returning the deleted id
    async fn delete_task(&self, id: &TaskId) -> Result<TaskId, RemoteError>;
}
