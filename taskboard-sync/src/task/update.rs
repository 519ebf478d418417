//! Update task fields

use super::{adopt, normalize_due_date, require_column, TaskPipeline};
use crate::error::{BoardError, Result};
use crate::remote::TaskPatch;
use crate::types::{BoardState, ColumnId, Task, TaskId};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// A caller's partial update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ColumnId>,
    /// Due date as typed by the user; blank leaves the date unchanged
    pub due_date: Option<String>,
}

impl TaskUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the column
    pub fn with_status(mut self, status: impl Into<ColumnId>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set the due date text
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Validate against the board and produce the remote patch
    fn normalize(&self, board: &BoardState, id: &TaskId) -> Result<TaskPatch> {
        if board.find_task(id).is_none() {
            return Err(BoardError::task_not_found(id.as_str()));
        }

        let title = match self.title.as_deref().map(str::trim) {
            Some("") => {
                return Err(BoardError::invalid_input("title", "task title cannot be empty"))
            }
            other => other.map(str::to_string),
        };

        if let Some(status) = &self.status {
            require_column(board, status)?;
        }

        let patch = TaskPatch {
            title,
            description: self.description.as_deref().map(|d| d.trim().to_string()),
            status: self.status.clone(),
            due_date: normalize_due_date(self.due_date.as_deref())?,
        };

        if patch.is_empty() {
            return Err(BoardError::invalid_input("update", "no fields to change"));
        }
        Ok(patch)
    }
}

impl TaskPipeline {
    /// Update a task and replace the local copy with the server's
    #[instrument(skip(self, state, update), fields(task = %id))]
    pub async fn update(
        &self,
        state: &RwLock<BoardState>,
        id: &TaskId,
        update: &TaskUpdate,
    ) -> Result<Task> {
        let patch = update.normalize(&*state.read().await, id)?;
        self.send_patch(state, id, &patch).await
    }

    /// Remote phase and apply phase shared by update and move
    pub(super) async fn send_patch(
        &self,
        state: &RwLock<BoardState>,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Task> {
        debug!(?patch, "update validated");

        let task = self
            .remote()
            .update_task(id, patch)
            .await
            .map_err(|e| BoardError::remote("updateTask", e))?;

        let mut board = state.write().await;
        if board.find_task(id).is_none() {
            debug!("task left the board while the update was in flight, dropping confirmation");
            return Ok(task);
        }
        let task = adopt(&mut board, task);
        info!(status = %task.status, "task updated");
        Ok(task)
    }
}
