//! Board-level types: Column, BoardState

use super::ids::{ColumnId, TaskId};
use super::task::Task;
use crate::column::ColumnRegistry;
use serde::{Deserialize, Serialize};

/// A column is a status bucket on the board.
///
/// The id is fixed at creation (equal to the title at that moment) and is what
/// tasks store in `status`; the title is display-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
}

impl Column {
    /// Create a column whose id equals its title
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: ColumnId::from_string(title.clone()),
            title,
        }
    }
}

/// The full snapshot unit: every task plus the ordered columns.
///
/// Cloning produces a fully independent deep copy; nothing inside is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub tasks: Vec<Task>,
    pub columns: ColumnRegistry,
}

impl BoardState {
    /// An empty board with the given columns
    pub fn new(columns: ColumnRegistry) -> Self {
        Self {
            tasks: Vec::new(),
            columns,
        }
    }

    /// Find a task by id
    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Tasks whose status is the given column, in board order
    pub fn tasks_in<'a>(&'a self, column: &'a ColumnId) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| &t.status == column)
    }

    /// Replace the task with the same id, or append it if absent
    pub fn upsert_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Replace the task with the same id. Returns false if it is not present.
    pub fn replace_task(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task;
                true
            }
            None => false,
        }
    }

    /// Remove a task by id, returning it if it was present
    pub fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Rewrite `status` of every task in `from` to `to`. Returns how many moved.
    pub fn relabel(&mut self, from: &ColumnId, to: &ColumnId) -> usize {
        let mut moved = 0;
        for task in self.tasks.iter_mut().filter(|t| &t.status == from) {
            task.status = to.clone();
            moved += 1;
        }
        moved
    }

    /// Move tasks whose status names no registered column into the first column.
    ///
    /// Local view only; the remote keeps whatever status it has.
    pub fn adopt_orphans(&mut self) -> usize {
        let first = self.columns.first().id.clone();
        let mut adopted = 0;
        for task in self.tasks.iter_mut() {
            if !self.columns.contains(&task.status) {
                task.status = first.clone();
                adopted += 1;
            }
        }
        adopted
    }

    /// Check that every task sits in a registered column
    pub fn statuses_consistent(&self) -> bool {
        self.tasks.iter().all(|t| self.columns.contains(&t.status))
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(ColumnRegistry::default())
    }
}
