//! BoardStore - the aggregate root for a synchronized board
//!
//! Owns the live [`BoardState`], the undo history and the activity log, and
//! coordinates the column registry, task pipeline and layout persistence.
//!
//! All methods take `&self`. The board sits behind a `tokio::sync::RwLock`
//! that is never held while a remote call is awaited, so operations may
//! overlap; the last confirmation applied wins for a given task.

use crate::activity::{ActivityEntry, ActivityLog, Outcome};
use crate::column::ColumnRegistry;
use crate::config::SyncConfig;
use crate::error::{BoardError, Result};
use crate::history::HistoryBuffer;
use crate::layout::{decode_layout, encode_layout, FileLayoutStore, LayoutStore, MemoryLayoutStore};
use crate::remote::{GraphqlRemote, RemoteStore};
use crate::task::{TaskInput, TaskPipeline, TaskUpdate};
use crate::types::{BoardState, Column, ColumnId, OwnerId, Task, TaskId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// What a column removal did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRemoval {
    /// The column that was removed
    pub removed: ColumnId,
    /// The column its tasks were moved into
    pub target: ColumnId,
    /// How many tasks were moved
    pub relabelled: usize,
}

/// A task board kept in step with a remote store
pub struct BoardStore {
    state: RwLock<BoardState>,
    history: Mutex<HistoryBuffer>,
    owner: RwLock<Option<OwnerId>>,
    pipeline: TaskPipeline,
    layout: Arc<dyn LayoutStore>,
    activity: Mutex<ActivityLog>,
}

impl BoardStore {
    /// Create a store with the default layout and no owner session
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        layout: Arc<dyn LayoutStore>,
        history_capacity: usize,
    ) -> Self {
        Self {
            state: RwLock::new(BoardState::default()),
            history: Mutex::new(HistoryBuffer::new(history_capacity)),
            owner: RwLock::new(None),
            pipeline: TaskPipeline::new(remote),
            layout,
            activity: Mutex::new(ActivityLog::default()),
        }
    }

    /// Create a store talking to the configured GraphQL endpoint.
    ///
    /// The layout is kept in a file when a layout path can be resolved and in
    /// memory otherwise.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let remote =
            GraphqlRemote::new(&config.remote).map_err(|e| BoardError::remote("connect", e))?;
        let layout: Arc<dyn LayoutStore> = match config.layout_path() {
            Some(path) => Arc::new(FileLayoutStore::new(path)),
            None => {
                warn!("no config directory, column layout will not be persisted");
                Arc::new(MemoryLayoutStore::new())
            }
        };
        Ok(Self::new(Arc::new(remote), layout, config.history_capacity))
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Start a session for `owner`: load the layout, clear history and load tasks.
    ///
    /// When the task list cannot be fetched the error is returned, but the
    /// board stays usable with the loaded columns and no tasks.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn initialize(&self, owner: OwnerId) -> Result<usize> {
        let started = Instant::now();
        let columns = self.load_layout().await;

        *self.state.write().await = BoardState::new(columns);
        self.history.lock().await.clear();
        *self.owner.write().await = Some(owner.clone());

        let result = self.reload_tasks(&owner).await;
        self.record("initialize", Some(owner.to_string()), started, &result)
            .await;
        result
    }

    /// Replace every task with the remote's current list for `owner`.
    ///
    /// The session switches to `owner` only once the list arrives. On failure
    /// the local tasks and the session owner are left as they were.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn refresh(&self, owner: OwnerId) -> Result<usize> {
        let started = Instant::now();
        let result = self.reload_tasks(&owner).await;
        if result.is_ok() {
            *self.owner.write().await = Some(owner.clone());
        }
        self.record("refresh", Some(owner.to_string()), started, &result)
            .await;
        result
    }

    async fn reload_tasks(&self, owner: &OwnerId) -> Result<usize> {
        let tasks = self
            .pipeline
            .remote()
            .list_tasks(owner)
            .await
            .map_err(|e| BoardError::remote("listTasks", e))?;

        let mut state = self.state.write().await;
        state.tasks = tasks;
        let adopted = state.adopt_orphans();
        if adopted > 0 {
            info!(adopted, "tasks in unknown columns moved to the first column");
        }
        debug!(count = state.tasks.len(), "tasks loaded");
        Ok(state.tasks.len())
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Append a column. Not undo-tracked.
    #[instrument(skip(self))]
    pub async fn add_column(&self, title: &str) -> Result<Column> {
        let started = Instant::now();
        let result = {
            let mut state = self.state.write().await;
            state
                .columns
                .add(title)
                .map(|column| (column, state.columns.clone()))
        };

        let result = match result {
            Ok((column, columns)) => {
                self.save_layout(&columns).await;
                info!(column = %column.id, "column added");
                Ok(column)
            }
            Err(e) => Err(e),
        };
        self.record("add column", Some(title.to_string()), started, &result)
            .await;
        result
    }

    /// Remove a column and move its tasks into the (new) first column.
    ///
    /// The board as it was before is pushed onto the undo history. The moved
    /// tasks are relabelled locally only; the remote keeps their old status
    /// until they are next updated.
    #[instrument(skip(self), fields(column = %id))]
    pub async fn remove_column(&self, id: &ColumnId) -> Result<ColumnRemoval> {
        let started = Instant::now();
        let result = self.apply_column_removal(id).await;
        self.record("remove column", Some(id.to_string()), started, &result)
            .await;
        result
    }

    async fn apply_column_removal(&self, id: &ColumnId) -> Result<ColumnRemoval> {
        let mut state = self.state.write().await;
        let before = state.clone();

        let removed = state.columns.remove(id)?;
        let target = state.columns.first().id.clone();
        let relabelled = state.relabel(&removed, &target);
        self.history.lock().await.snapshot(before);

        let columns = state.columns.clone();
        drop(state);

        self.save_layout(&columns).await;
        info!(relabelled, target = %target, "column removed");
        Ok(ColumnRemoval {
            removed,
            target,
            relabelled,
        })
    }

    /// Restore the board as it was before the most recent column removal
    #[instrument(skip(self))]
    pub async fn undo(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.apply_undo().await;
        self.record("undo", None, started, &result).await;
        result
    }

    async fn apply_undo(&self) -> Result<()> {
        let snapshot = self.history.lock().await.undo()?;
        let columns = snapshot.columns.clone();
        *self.state.write().await = snapshot;

        self.save_layout(&columns).await;
        info!("board restored from history");
        Ok(())
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Create a task owned by the session's owner
    pub async fn create_task(&self, input: TaskInput) -> Result<Task> {
        let started = Instant::now();
        let owner = self.owner.read().await.clone();
        let result = match owner {
            Some(owner) => self.pipeline.create(&self.state, &owner, &input).await,
            None => Err(BoardError::NoSession),
        };
        let target = result.as_ref().ok().map(|t| t.id.to_string());
        self.record("create task", target, started, &result).await;
        result
    }

    /// Change some fields of a task
    pub async fn update_task(&self, id: &TaskId, update: TaskUpdate) -> Result<Task> {
        let started = Instant::now();
        let result = self.pipeline.update(&self.state, id, &update).await;
        self.record("update task", Some(id.to_string()), started, &result)
            .await;
        result
    }

    /// Delete a task
    pub async fn delete_task(&self, id: &TaskId) -> Result<TaskId> {
        let started = Instant::now();
        let result = self.pipeline.delete(&self.state, id).await;
        self.record("delete task", Some(id.to_string()), started, &result)
            .await;
        result
    }

    /// Move a task to another column
    pub async fn move_task(&self, id: &TaskId, status: &ColumnId) -> Result<Task> {
        let started = Instant::now();
        let result = self.pipeline.move_task(&self.state, id, status).await;
        self.record("move task", Some(id.to_string()), started, &result)
            .await;
        result
    }

    /// Read a task from the remote, refreshing the local copy
    pub async fn fetch_task(&self, id: &TaskId) -> Result<Task> {
        let started = Instant::now();
        let result = self.pipeline.fetch(&self.state, id).await;
        self.record("fetch task", Some(id.to_string()), started, &result)
            .await;
        result
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn columns(&self) -> Vec<Column> {
        self.state.read().await.columns.list().to_vec()
    }

    /// Tasks in one column, in board order
    pub async fn tasks_in(&self, column: &ColumnId) -> Vec<Task> {
        self.state.read().await.tasks_in(column).cloned().collect()
    }

    /// A task from the local board
    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        self.state.read().await.find_task(id).cloned()
    }

    /// A deep copy of the whole board
    pub async fn snapshot(&self) -> BoardState {
        self.state.read().await.clone()
    }

    pub async fn can_undo(&self) -> bool {
        !self.history.lock().await.is_empty()
    }

    /// Number of recorded undo snapshots
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    pub async fn owner(&self) -> Option<OwnerId> {
        self.owner.read().await.clone()
    }

    /// Recent operations, newest first
    pub async fn activity(&self) -> Vec<ActivityEntry> {
        self.activity.lock().await.entries().cloned().collect()
    }

    // =========================================================================
    // Layout and activity
    // =========================================================================

    async fn load_layout(&self) -> ColumnRegistry {
        match self.layout.load().await {
            Ok(Some(blob)) => match decode_layout(&blob) {
                Ok(columns) => {
                    debug!(columns = columns.len(), "layout loaded");
                    columns
                }
                Err(error) => {
                    warn!(%error, "stored layout is malformed, using default columns");
                    ColumnRegistry::default()
                }
            },
            Ok(None) => {
                debug!("no stored layout, using default columns");
                ColumnRegistry::default()
            }
            Err(error) => {
                warn!(%error, "stored layout is unreadable, using default columns");
                ColumnRegistry::default()
            }
        }
    }

    async fn save_layout(&self, columns: &ColumnRegistry) {
        let saved = match encode_layout(columns) {
            Ok(blob) => self.layout.save(&blob).await,
            Err(error) => Err(error),
        };
        if let Err(error) = saved {
            warn!(%error, "failed to persist column layout");
        }
    }

    async fn record<T>(
        &self,
        op: &'static str,
        target: Option<String>,
        started: Instant,
        result: &Result<T>,
    ) {
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let entry = match result {
            Ok(_) => ActivityEntry::new(op, target, Outcome::Applied, duration_ms),
            Err(error) => {
                warn!(op, %error, "operation rejected");
                ActivityEntry::rejected(op, target, error, duration_ms)
            }
        };
        self.activity.lock().await.record(entry);
    }
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStore").finish_non_exhaustive()
    }
}
