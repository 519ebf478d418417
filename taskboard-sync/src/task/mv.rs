//! Move a task to another column

use super::{require_column, TaskPipeline};
use crate::error::{BoardError, Result};
use crate::remote::TaskPatch;
use crate::types::{BoardState, ColumnId, Task, TaskId};
use tokio::sync::RwLock;
use tracing::instrument;

impl TaskPipeline {
    /// Change a task's column. Same remote call as an update of `status` alone.
    #[instrument(skip(self, state), fields(task = %id, to = %status))]
    pub async fn move_task(
        &self,
        state: &RwLock<BoardState>,
        id: &TaskId,
        status: &ColumnId,
    ) -> Result<Task> {
        {
            let board = state.read().await;
            if board.find_task(id).is_none() {
                return Err(BoardError::task_not_found(id.as_str()));
            }
            require_column(&board, status)?;
        }

        self.send_patch(state, id, &TaskPatch::status(status.clone()))
            .await
    }
}
