//! In-process remote store

use super::{NewTask, RemoteError, RemoteStore, TaskPatch};
use crate::types::{ColumnId, OwnerId, Task, TaskId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Status the store assigns when a create request leaves it unset
const SERVER_DEFAULT_STATUS: &str = "Task Ready";

/// The five remote operations, used to record calls and inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCall {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
    failing: HashSet<RemoteCall>,
    calls: Vec<RemoteCall>,
}

/// A remote store that lives in memory.
///
/// Assigns sequential ids, stamps timestamps with the current time and records
/// every call it receives. Any operation can be switched to fail with
/// [`InMemoryRemote::fail_on`].
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    inner: Mutex<Inner>,
}

impl InMemoryRemote {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `tasks`
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|t| t.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            inner: Mutex::new(Inner {
                tasks,
                next_id,
                ..Inner::default()
            }),
        }
    }

    /// Make every subsequent `call` fail until [`recover`](Self::recover)
    pub async fn fail_on(&self, call: RemoteCall) {
        self.inner.lock().await.failing.insert(call);
    }

    /// Stop failing `call`
    pub async fn recover(&self, call: RemoteCall) {
        self.inner.lock().await.failing.remove(&call);
    }

    /// Every call received so far, in order
    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().await.calls.clone()
    }

    /// How many times `call` was received
    pub async fn call_count(&self, call: RemoteCall) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    /// Server-side copy of all tasks
    pub async fn stored_tasks(&self) -> Vec<Task> {
        self.inner.lock().await.tasks.clone()
    }

    /// Insert or replace a task directly, bypassing the call log
    pub async fn seed(&self, task: Task) {
        let mut inner = self.inner.lock().await;
        match inner.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => inner.tasks.push(task),
        }
    }

    /// Record the call and fail it if injection is active
    async fn enter(&self, call: RemoteCall) -> Result<tokio::sync::MutexGuard<'_, Inner>, RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(call);
        if inner.failing.contains(&call) {
            return Err(RemoteError::Rejected {
                message: format!("injected failure for {call:?}"),
            });
        }
        Ok(inner)
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, RemoteError> {
        let inner = self.enter(RemoteCall::List).await?;
        let mut tasks: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| &t.owner_id == owner)
            .cloned()
            .collect();
        // Newest first, matching the server's ordering
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn get_task(&self, id: &TaskId) -> Result<Task, RemoteError> {
        let inner = self.enter(RemoteCall::Get).await?;
        inner
            .tasks
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound { id: id.to_string() })
    }

    async fn create_task(&self, input: &NewTask) -> Result<Task, RemoteError> {
        let mut inner = self.enter(RemoteCall::Create).await?;
        inner.next_id += 1;

        let now = Utc::now();
        let task = Task {
            id: TaskId::from_string(inner.next_id.to_string()),
            title: input.title.clone(),
            description: input.description.clone(),
            status: input
                .status
                .clone()
                .unwrap_or_else(|| ColumnId::from_string(SERVER_DEFAULT_STATUS)),
            due_date: input.due_date,
            owner_id: input.owner_id.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteError> {
        let mut inner = self.enter(RemoteCall::Update).await?;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| RemoteError::NotFound { id: id.to_string() })?;

        patch.apply_to(task);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<TaskId, RemoteError> {
        let mut inner = self.enter(RemoteCall::Delete).await?;
        let index = inner
            .tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| RemoteError::NotFound { id: id.to_string() })?;
        Ok(inner.tasks.remove(index).id)
    }
}
