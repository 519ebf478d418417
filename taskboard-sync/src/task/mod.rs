//! Task mutation pipeline
//!
//! Every task operation runs the same three phases:
//!
//! 1. **Validate** against the local board under a read lock
//! 2. **Call** the remote store with no lock held
//! 3. **Apply** the confirmed task under a write lock
//!
//! Nothing is applied before the remote confirms, so a failed call leaves the
//! board exactly as it was and there is nothing to roll back.

mod add;
mod delete;
mod get;
mod mv;
mod update;

pub use add::TaskInput;
pub use update::TaskUpdate;

use crate::error::{BoardError, Result};
use crate::remote::RemoteStore;
use crate::types::{parse_instant, BoardState, ColumnId, Task};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Runs task operations against a board and a remote store
#[derive(Clone)]
pub struct TaskPipeline {
    remote: Arc<dyn RemoteStore>,
}

impl TaskPipeline {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    pub(crate) fn remote(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }
}

impl std::fmt::Debug for TaskPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPipeline").finish_non_exhaustive()
    }
}

/// Turn caller-supplied due date text into an instant. Blank means no date.
pub fn normalize_due_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_instant(text).map(Some).ok_or_else(|| {
            BoardError::invalid_input("due_date", format!("unrecognized date '{text}'"))
        }),
    }
}

/// Check that `status` names a registered column
fn require_column(board: &BoardState, status: &ColumnId) -> Result<()> {
    if board.columns.contains(status) {
        Ok(())
    } else {
        Err(BoardError::InvalidColumn {
            id: status.to_string(),
        })
    }
}

/// Store a confirmed task, keeping its status on the board.
///
/// Returns the task as it now sits locally.
fn adopt(board: &mut BoardState, mut task: Task) -> Task {
    if !board.columns.contains(&task.status) {
        debug!(task = %task.id, status = %task.status, "confirmed task names no column, adopting");
        task.status = board.columns.first().id.clone();
    }
    board.upsert_task(task.clone());
    task
}
