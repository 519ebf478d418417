//! Board state synchronization engine for a remotely persisted task board
//!
//! This crate keeps a local view of a task board (ordered columns plus tasks)
//! consistent with an authoritative remote store while accepting edits from a
//! single user.
//!
//! ## Overview
//!
//! - **Remote is authoritative** - tasks enter the board only from remote responses
//! - **Deferred commit** - a task edit is applied locally only after the remote confirms it
//! - **Local columns** - the column layout lives on this machine and is persisted as JSON
//! - **Undo** - column removals can be undone from a bounded snapshot history
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskboard_sync::{BoardStore, InMemoryRemote, MemoryLayoutStore, TaskInput};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BoardStore::new(
//!     Arc::new(InMemoryRemote::new()),
//!     Arc::new(MemoryLayoutStore::new()),
//!     5,
//! );
//! store.initialize("42".into()).await?;
//!
//! let task = store
//!     .create_task(TaskInput::new("Write release notes").with_due_date("2025-07-01"))
//!     .await?;
//! store.move_task(&task.id, &"Done".into()).await?;
//!
//! store.remove_column(&"Needs Review".into()).await?;
//! store.undo().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`store`] - the [`BoardStore`] aggregate and its operations
//! - [`task`] - the validate / remote call / apply pipeline for task edits
//! - [`column`] - the ordered column registry
//! - [`history`] - bounded undo snapshots
//! - [`remote`] - the [`RemoteStore`] seam with GraphQL and in-memory adapters
//! - [`layout`] - column layout persistence
//! - [`activity`] - the per-operation activity log
//! - [`config`] - layered configuration

pub mod activity;
pub mod column;
pub mod config;
mod error;
pub mod history;
pub mod layout;
pub mod remote;
pub mod store;
pub mod task;
pub mod types;

pub use activity::{ActivityEntry, ActivityLog, Outcome, Stage};
pub use column::ColumnRegistry;
pub use config::{ConfigError, RemoteConfig, SyncConfig};
pub use error::{BoardError, Result};
pub use history::HistoryBuffer;
pub use layout::{FileLayoutStore, LayoutError, LayoutStore, MemoryLayoutStore};
pub use remote::{GraphqlRemote, InMemoryRemote, NewTask, RemoteError, RemoteStore, TaskPatch};
pub use store::{BoardStore, ColumnRemoval};
pub use task::{TaskInput, TaskUpdate};
pub use types::{BoardState, Column, ColumnId, OwnerId, Task, TaskId};
