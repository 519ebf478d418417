//! Fetch a single task from the remote

use super::{adopt, TaskPipeline};
use crate::error::{BoardError, Result};
use crate::types::{BoardState, Task, TaskId};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

impl TaskPipeline {
    /// Read a task from the remote, refreshing the local copy if there is one
    #[instrument(skip(self, state), fields(task = %id))]
    pub async fn fetch(&self, state: &RwLock<BoardState>, id: &TaskId) -> Result<Task> {
        let task = self
            .remote()
            .get_task(id)
            .await
            .map_err(|e| BoardError::remote("getTask", e))?;

        let mut board = state.write().await;
        if board.find_task(id).is_some() {
            return Ok(adopt(&mut board, task));
        }
        debug!("fetched task is not on the local board");
        Ok(task)
    }
}
