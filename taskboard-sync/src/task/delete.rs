//! Delete a task

use super::TaskPipeline;
use crate::error::{BoardError, Result};
use crate::types::{BoardState, TaskId};
use tokio::sync::RwLock;
use tracing::{info, instrument};

impl TaskPipeline {
    /// Delete a task remotely, then drop it from the board
    #[instrument(skip(self, state), fields(task = %id))]
    pub async fn delete(&self, state: &RwLock<BoardState>, id: &TaskId) -> Result<TaskId> {
        if state.read().await.find_task(id).is_none() {
            return Err(BoardError::task_not_found(id.as_str()));
        }

        let deleted = self
            .remote()
            .delete_task(id)
            .await
            .map_err(|e| BoardError::remote("deleteTask", e))?;

        state.write().await.remove_task(id);
        info!("task deleted");
        Ok(deleted)
    }
}
