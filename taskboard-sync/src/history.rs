//! Bounded snapshot stack for undoing structural edits

use crate::error::{BoardError, Result};
use crate::types::BoardState;
use std::collections::VecDeque;

/// Number of snapshots kept when no capacity is configured
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Most-recent-first stack of board snapshots.
///
/// Entries are deep copies taken before a destructive edit. When the stack
/// grows past its capacity the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<BoardState>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` snapshots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Record a copy of the board taken before a destructive edit, evicting
    /// the oldest entry if over capacity
    pub fn snapshot(&mut self, state: BoardState) {
        self.entries.push_front(state);
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Remove and return the most recent snapshot
    pub fn undo(&mut self) -> Result<BoardState> {
        self.entries.pop_front().ok_or(BoardError::EmptyHistory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every snapshot
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
