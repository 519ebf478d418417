//! Create a task

use super::{adopt, normalize_due_date, require_column, TaskPipeline};
use crate::error::{BoardError, Result};
use crate::remote::NewTask;
use crate::types::{BoardState, ColumnId, OwnerId, Task};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// A caller's request to create a task
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskInput {
    /// The task title (required)
    pub title: String,
    pub description: Option<String>,
    /// Column to place the task in; the first column when unset
    pub status: Option<ColumnId>,
    /// Due date as typed by the user
    pub due_date: Option<String>,
}

impl TaskInput {
    /// Create a new TaskInput with just a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
            due_date: None,
        }
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

    /// Validate against the board and produce the remote request
    fn normalize(&self, board: &BoardState, owner: &OwnerId) -> Result<NewTask> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(BoardError::invalid_input("title", "task title cannot be empty"));
        }

        let status = match &self.status {
            Some(status) => {
                require_column(board, status)?;
                status.clone()
            }
            None => board.columns.first().id.clone(),
        };

        Ok(NewTask {
            title: title.to_string(),
            description: Some(
                self.description
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
            ),
            status: Some(status),
            due_date: normalize_due_date(self.due_date.as_deref())?,
            owner_id: owner.clone(),
        })
    }
}

impl TaskPipeline {
    /// Create a task and append the server's copy to the board
    #[instrument(skip(self, state, input), fields(title = %input.title))]
    pub async fn create(
        &self,
        state: &RwLock<BoardState>,
        owner: &OwnerId,
        input: &TaskInput,
    ) -> Result<Task> {
        let request = input.normalize(&*state.read().await, owner)?;
        debug!(status = ?request.status, "create validated");

        let task = self
            .remote()
            .create_task(&request)
            .await
            .map_err(|e| BoardError::remote("createTask", e))?;

        let task = adopt(&mut *state.write().await, task);
        info!(task = %task.id, "task created");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{InMemoryRemote, RemoteCall};
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryRemote>, TaskPipeline, RwLock<BoardState>) {
        let remote = Arc::new(InMemoryRemote::new());
        let pipeline = TaskPipeline::new(remote.clone());
        (remote, pipeline, RwLock::new(BoardState::default()))
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (_remote, pipeline, state) = setup();
        let task = pipeline
            .create(&state, &"u1".into(), &TaskInput::new("  Write docs  "))
            .await
            .unwrap();

        assert_eq!(task.title, "Write docs");
        assert_eq!(task.status.as_str(), "Task Ready");
        assert_eq!(task.description.as_deref(), Some(""));
        assert_eq!(state.read().await.tasks, vec![task]);
    }

    #[tokio::test]
    async fn test_create_blank_title_never_calls_remote() {
        let (remote, pipeline, state) = setup();
        let result = pipeline
            .create(&state, &"u1".into(), &TaskInput::new("   "))
            .await;

        assert!(matches!(result, Err(BoardError::InvalidInput { .. })));
        assert_eq!(remote.call_count(RemoteCall::Create).await, 0);
        assert!(state.read().await.tasks.is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_status() {
        let (remote, pipeline, state) = setup();
        let input = TaskInput::new("t").with_status("Nowhere");
        let result = pipeline.create(&state, &"u1".into(), &input).await;

        assert!(matches!(result, Err(BoardError::InvalidColumn { .. })));
        assert!(remote.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_bad_due_date() {
        let (remote, pipeline, state) = setup();
        let input = TaskInput::new("t").with_due_date("someday");
        let result = pipeline.create(&state, &"u1".into(), &input).await;

        assert!(matches!(result, Err(BoardError::InvalidInput { .. })));
        assert!(remote.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_remote_failure_leaves_board() {
        let (remote, pipeline, state) = setup();
        remote.fail_on(RemoteCall::Create).await;
        let before = state.read().await.clone();

        let result = pipeline
            .create(&state, &"u1".into(), &TaskInput::new("t").with_status("Done"))
            .await;

        assert!(matches!(result, Err(BoardError::RemoteFailure { .. })));
        assert_eq!(*state.read().await, before);
    }
}
