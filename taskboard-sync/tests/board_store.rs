//! End-to-end behavior of BoardStore against the in-memory remote

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use taskboard_sync::remote::RemoteCall;
use taskboard_sync::{
    BoardError, BoardStore, ColumnId, FileLayoutStore, InMemoryRemote, MemoryLayoutStore, NewTask,
    Outcome, OwnerId, RemoteError, RemoteStore, Task, TaskId, TaskInput, TaskPatch, TaskUpdate,
};
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing_test::traced_test;

const OWNER: &str = "u1";

fn task(id: &str, status: &str, minutes: i64) -> Task {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
    Task::new(id, format!("Task {id}"), status, OWNER, created)
}

fn layout(columns: &[&str]) -> String {
    let columns: Vec<_> = columns
        .iter()
        .map(|c| serde_json::json!({"id": c, "title": c}))
        .collect();
    serde_json::json!({ "columns": columns }).to_string()
}

async fn setup(columns: &[&str], tasks: Vec<Task>) -> (Arc<InMemoryRemote>, BoardStore) {
    let remote = Arc::new(InMemoryRemote::with_tasks(tasks));
    let store = BoardStore::new(
        remote.clone(),
        Arc::new(MemoryLayoutStore::with_blob(layout(columns))),
        5,
    );
    store.initialize(OWNER.into()).await.unwrap();
    (remote, store)
}

fn ids(columns: Vec<taskboard_sync::Column>) -> Vec<String> {
    columns.into_iter().map(|c| c.id.to_string()).collect()
}

/// Applies updates on the wrapped remote immediately but holds each
/// confirmation until its gate is released. Every applied update is
/// announced on `applied`.
struct HeldUpdates {
    inner: Arc<InMemoryRemote>,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    applied: mpsc::UnboundedSender<TaskId>,
}

impl HeldUpdates {
    fn new(inner: Arc<InMemoryRemote>) -> (Arc<Self>, mpsc::UnboundedReceiver<TaskId>) {
        let (applied, rx) = mpsc::unbounded_channel();
        let held = Arc::new(Self {
            inner,
            gates: Mutex::new(VecDeque::new()),
            applied,
        });
        (held, rx)
    }

    /// Hold the confirmation of the next update until the sender fires
    async fn hold_next(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.gates.lock().await.push_back(gate);
        release
    }
}

#[async_trait]
impl RemoteStore for HeldUpdates {
    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, RemoteError> {
        self.inner.list_tasks(owner).await
    }

    async fn get_task(&self, id: &TaskId) -> Result<Task, RemoteError> {
        self.inner.get_task(id).await
    }

    async fn create_task(&self, input: &NewTask) -> Result<Task, RemoteError> {
        self.inner.create_task(input).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteError> {
        let gate = self.gates.lock().await.pop_front();
        let task = self.inner.update_task(id, patch).await?;
        let _ = self.applied.send(id.clone());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(task)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<TaskId, RemoteError> {
        self.inner.delete_task(id).await
    }
}

async fn held_setup(
    columns: &[&str],
    tasks: Vec<Task>,
) -> (
    Arc<InMemoryRemote>,
    Arc<HeldUpdates>,
    mpsc::UnboundedReceiver<TaskId>,
    BoardStore,
) {
    let remote = Arc::new(InMemoryRemote::with_tasks(tasks));
    let (held, applied) = HeldUpdates::new(remote.clone());
    let store = BoardStore::new(
        held.clone(),
        Arc::new(MemoryLayoutStore::with_blob(layout(columns))),
        5,
    );
    store.initialize(OWNER.into()).await.unwrap();
    (remote, held, applied, store)
}

#[tokio::test]
async fn test_initialize_loads_owner_tasks_newest_first() {
    let mut foreign = task("3", "A", 5);
    foreign.owner_id = "u2".into();
    let (_remote, store) = setup(&["A", "B"], vec![task("1", "A", 0), task("2", "B", 1), foreign]).await;

    let tasks = store.tasks().await;
    let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(store.owner().await.unwrap().as_str(), OWNER);
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let (_remote, store) = setup(&["A", "B"], vec![task("1", "A", 0), task("2", "B", 1)]).await;

    store.refresh(OWNER.into()).await.unwrap();
    let first = store.tasks().await;
    store.refresh(OWNER.into()).await.unwrap();
    assert_eq!(store.tasks().await, first);
}

#[tokio::test]
async fn test_refresh_failure_keeps_tasks() {
    let (remote, store) = setup(&["A"], vec![task("1", "A", 0)]).await;
    remote.fail_on(RemoteCall::List).await;

    let result = store.refresh(OWNER.into()).await;
    assert!(matches!(result, Err(BoardError::RemoteFailure { .. })));
    assert_eq!(store.tasks().await.len(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_session_owner() {
    let (remote, store) = setup(&["A"], vec![task("1", "A", 0)]).await;
    remote.fail_on(RemoteCall::List).await;

    let result = store.refresh("u2".into()).await;
    assert!(matches!(result, Err(BoardError::RemoteFailure { .. })));
    assert_eq!(store.owner().await.unwrap().as_str(), OWNER);

    // New tasks still belong to the owner whose board is shown
    remote.recover(RemoteCall::List).await;
    let created = store.create_task(TaskInput::new("mine")).await.unwrap();
    assert_eq!(created.owner_id.as_str(), OWNER);

    store.refresh("u2".into()).await.unwrap();
    assert_eq!(store.owner().await.unwrap().as_str(), "u2");
    assert!(store.tasks().await.is_empty());
}

#[tokio::test]
async fn test_initialize_failure_leaves_usable_board() {
    let remote = Arc::new(InMemoryRemote::with_tasks(vec![task("1", "A", 0)]));
    remote.fail_on(RemoteCall::List).await;
    let store = BoardStore::new(
        remote.clone(),
        Arc::new(MemoryLayoutStore::with_blob(layout(&["A", "B"]))),
        5,
    );

    let result = store.initialize(OWNER.into()).await;
    assert!(matches!(result, Err(BoardError::RemoteFailure { .. })));
    assert!(store.tasks().await.is_empty());
    assert_eq!(ids(store.columns().await), vec!["A", "B"]);

    remote.recover(RemoteCall::List).await;
    let created = store.create_task(TaskInput::new("after outage")).await.unwrap();
    assert_eq!(created.status.as_str(), "A");
}

#[tokio::test]
async fn test_failed_mutations_do_not_leak() {
    let (remote, store) = setup(&["A", "B"], vec![task("1", "A", 0)]).await;
    let before = store.snapshot().await;

    remote.fail_on(RemoteCall::Create).await;
    remote.fail_on(RemoteCall::Update).await;
    remote.fail_on(RemoteCall::Delete).await;

    let id = "1".into();
    assert!(store.create_task(TaskInput::new("new")).await.is_err());
    assert!(store
        .update_task(&id, TaskUpdate::new().with_title("renamed"))
        .await
        .is_err());
    assert!(store.move_task(&id, &"B".into()).await.is_err());
    assert!(store.delete_task(&id).await.is_err());

    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_blank_title_makes_no_remote_call() {
    let (remote, store) = setup(&["A"], Vec::new()).await;

    let result = store.create_task(TaskInput::new("  ")).await;
    assert!(matches!(result, Err(BoardError::InvalidInput { .. })));
    assert_eq!(remote.call_count(RemoteCall::Create).await, 0);
    assert!(store.tasks().await.is_empty());
}

#[tokio::test]
async fn test_task_lifecycle() {
    let (remote, store) = setup(&["A", "B", "C"], Vec::new()).await;

    let created = store
        .create_task(
            TaskInput::new("Plan sprint")
                .with_description("  agenda  ")
                .with_due_date("2025-05-01T10:00:00Z"),
        )
        .await
        .unwrap();
    assert_eq!(created.status.as_str(), "A");
    assert_eq!(created.description.as_deref(), Some("agenda"));

    let moved = store.move_task(&created.id, &"C".into()).await.unwrap();
    assert_eq!(moved.status.as_str(), "C");
    assert_eq!(store.tasks_in(&"C".into()).await, vec![moved.clone()]);

    let fetched = store.fetch_task(&created.id).await.unwrap();
    assert_eq!(fetched, moved);

    store.delete_task(&created.id).await.unwrap();
    assert!(store.tasks().await.is_empty());
    assert!(remote.stored_tasks().await.is_empty());
}

#[tokio::test]
async fn test_remove_column_relabels_to_new_first_column() {
    let (remote, store) = setup(
        &["A", "B", "C"],
        vec![task("1", "A", 0), task("2", "A", 1), task("3", "C", 2)],
    )
    .await;

    let removal = store.remove_column(&"A".into()).await.unwrap();
    assert_eq!(removal.target.as_str(), "B");
    assert_eq!(removal.relabelled, 2);

    let tasks = store.tasks().await;
    assert!(tasks.iter().all(|t| t.status.as_str() != "A"));
    assert_eq!(store.tasks_in(&"B".into()).await.len(), 2);
    assert_eq!(store.tasks_in(&"C".into()).await.len(), 1);

    // Local only: the remote was not asked to update anything
    assert_eq!(remote.call_count(RemoteCall::Update).await, 0);
}

#[tokio::test]
async fn test_remove_middle_column_relabels_to_first() {
    let (_remote, store) = setup(&["A", "B", "C"], vec![task("1", "B", 0)]).await;

    store.remove_column(&"B".into()).await.unwrap();
    assert_eq!(store.tasks().await[0].status.as_str(), "A");
}

#[tokio::test]
async fn test_last_column_rejection() {
    let (_remote, store) = setup(&["Only"], vec![task("1", "Only", 0)]).await;
    let before = store.snapshot().await;

    let result = store.remove_column(&"Only".into()).await;
    assert!(matches!(result, Err(BoardError::LastColumn { .. })));
    assert_eq!(store.snapshot().await, before);
    assert!(!store.can_undo().await);
}

#[tokio::test]
async fn test_undo_restores_exact_snapshot() {
    let (_remote, store) = setup(&["A", "B"], vec![task("1", "A", 0), task("2", "B", 1)]).await;
    let before = store.snapshot().await;

    store.remove_column(&"A".into()).await.unwrap();
    assert_ne!(store.snapshot().await, before);

    store.undo().await.unwrap();
    assert_eq!(store.snapshot().await, before);
    assert!(!store.can_undo().await);
}

#[tokio::test]
async fn test_remove_then_undo_scenario() {
    let (_remote, store) = setup(&["A", "B"], vec![task("T1", "A", 0)]).await;

    store.remove_column(&"A".into()).await.unwrap();
    assert_eq!(ids(store.columns().await), vec!["B"]);
    assert_eq!(store.tasks().await[0].status.as_str(), "B");

    store.undo().await.unwrap();
    assert_eq!(ids(store.columns().await), vec!["A", "B"]);
    assert_eq!(store.tasks().await[0].status.as_str(), "A");
}

#[tokio::test]
async fn test_history_is_bounded() {
    let columns = ["C0", "C1", "C2", "C3", "C4", "C5", "C6", "C7"];
    let (_remote, store) = setup(&columns, vec![task("1", "C0", 0)]).await;

    for column in &columns[..6] {
        store.remove_column(&ColumnId::from(*column)).await.unwrap();
    }
    assert_eq!(store.history_len().await, 5);

    for _ in 0..5 {
        store.undo().await.unwrap();
    }
    // The oldest snapshot (before C0 was removed) was evicted
    assert_eq!(ids(store.columns().await), vec!["C1", "C2", "C3", "C4", "C5", "C6", "C7"]);
    assert!(matches!(store.undo().await, Err(BoardError::EmptyHistory)));
}

#[tokio::test]
async fn test_refresh_adopts_relabelled_tasks() {
    let (_remote, store) = setup(&["A", "B"], vec![task("1", "A", 0)]).await;

    store.remove_column(&"A".into()).await.unwrap();
    // The remote still says "A"; the refreshed copy is adopted into "B"
    store.refresh(OWNER.into()).await.unwrap();

    let tasks = store.tasks().await;
    assert_eq!(tasks[0].status.as_str(), "B");
    assert!(store.snapshot().await.statuses_consistent());
}

#[tokio::test]
async fn test_update_of_relabelled_task_stays_on_board() {
    let (_remote, store) = setup(&["A", "B"], vec![task("1", "A", 0)]).await;
    store.remove_column(&"A".into()).await.unwrap();

    let updated = store
        .update_task(&"1".into(), TaskUpdate::new().with_title("renamed"))
        .await
        .unwrap();
    assert_eq!(updated.status.as_str(), "B");
    assert!(store.snapshot().await.statuses_consistent());
}

#[tokio::test]
async fn test_layout_round_trip_through_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("board").join("layout.json");

    let store = BoardStore::new(
        Arc::new(InMemoryRemote::new()),
        Arc::new(FileLayoutStore::new(&path)),
        5,
    );
    store.initialize(OWNER.into()).await.unwrap();
    store.add_column("Blocked").await.unwrap();
    store.remove_column(&"Needs Review".into()).await.unwrap();

    let reopened = BoardStore::new(
        Arc::new(InMemoryRemote::new()),
        Arc::new(FileLayoutStore::new(&path)),
        5,
    );
    reopened.initialize(OWNER.into()).await.unwrap();
    assert_eq!(ids(reopened.columns().await), vec!["Task Ready", "Done", "Blocked"]);
    assert!(!reopened.can_undo().await);
}

#[tokio::test]
async fn test_undo_persists_restored_layout() {
    let layout_store = Arc::new(MemoryLayoutStore::new());
    let store = BoardStore::new(Arc::new(InMemoryRemote::new()), layout_store.clone(), 5);
    store.initialize(OWNER.into()).await.unwrap();

    store.remove_column(&"Done".into()).await.unwrap();
    assert!(!layout_store.blob().await.unwrap().contains("Done"));

    store.undo().await.unwrap();
    assert!(layout_store.blob().await.unwrap().contains("Done"));
}

#[tokio::test]
#[traced_test]
async fn test_malformed_layout_falls_back_to_default() {
    let store = BoardStore::new(
        Arc::new(InMemoryRemote::new()),
        Arc::new(MemoryLayoutStore::with_blob("{\"columns\": [")),
        5,
    );
    store.initialize(OWNER.into()).await.unwrap();

    assert_eq!(ids(store.columns().await), vec!["Task Ready", "Needs Review", "Done"]);
    assert!(logs_contain("stored layout is malformed"));
}

#[tokio::test]
async fn test_duplicate_and_blank_columns() {
    let (_remote, store) = setup(&["A"], Vec::new()).await;

    assert!(matches!(
        store.add_column("A").await,
        Err(BoardError::DuplicateColumn { .. })
    ));
    assert!(matches!(
        store.add_column(" ").await,
        Err(BoardError::InvalidInput { .. })
    ));
    assert_eq!(store.columns().await.len(), 1);
}

#[tokio::test]
async fn test_update_confirmed_after_undo_is_dropped() {
    let (remote, held, mut applied, store) = held_setup(&["A", "B"], Vec::new()).await;
    store.remove_column(&"A".into()).await.unwrap();
    let created = store.create_task(TaskInput::new("draft")).await.unwrap();
    assert_eq!(created.status.as_str(), "B");

    let release = held.hold_next().await;
    let update = store.update_task(&created.id, TaskUpdate::new().with_title("renamed"));
    let meanwhile = async {
        applied.recv().await.unwrap();
        // The restored board predates the task
        store.undo().await.unwrap();
        release.send(()).unwrap();
    };
    let (result, ()) = tokio::join!(update, meanwhile);

    let confirmed = result.unwrap();
    assert_eq!(confirmed.title, "renamed");
    assert!(store.tasks().await.is_empty());
    assert_eq!(ids(store.columns().await), vec!["A", "B"]);
    assert_eq!(remote.stored_tasks().await.len(), 1);

    let latest = &store.activity().await[0];
    assert_eq!(latest.op, "update task");
    assert!(matches!(latest.outcome, Outcome::Applied));
}

#[tokio::test]
async fn test_last_confirmation_applied_wins() {
    let (remote, held, mut applied, store) = held_setup(&["A"], vec![task("1", "A", 0)]).await;
    let id: TaskId = "1".into();

    let release_first = held.hold_next().await;
    let release_second = held.hold_next().await;
    let first = store.update_task(&id, TaskUpdate::new().with_title("first"));
    let second = store.update_task(&id, TaskUpdate::new().with_title("second"));
    let confirmations = async {
        applied.recv().await.unwrap();
        applied.recv().await.unwrap();

        // Confirm in reverse order of sending
        release_second.send(()).unwrap();
        while store.task(&id).await.unwrap().title != "second" {
            tokio::task::yield_now().await;
        }
        release_first.send(()).unwrap();
    };
    let (first, second, ()) = tokio::join!(first, second, confirmations);

    assert_eq!(first.unwrap().title, "first");
    assert_eq!(second.unwrap().title, "second");
    // The remote saw "second" last, but "first" was confirmed last
    assert_eq!(remote.stored_tasks().await[0].title, "second");
    assert_eq!(store.task(&id).await.unwrap().title, "first");
}
