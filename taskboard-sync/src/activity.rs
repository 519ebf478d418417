//! Activity log: one entry per board operation

use crate::error::BoardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Entries kept before the oldest is dropped
pub const ACTIVITY_CAPACITY: usize = 100;

/// Where a rejected operation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Refused locally before any remote call
    Validation,
    /// The remote call failed
    Remote,
}

impl Stage {
    /// The stage an error was raised in
    pub fn of(error: &BoardError) -> Self {
        match error {
            BoardError::RemoteFailure { .. } => Self::Remote,
            _ => Self::Validation,
        }
    }
}

/// How an operation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Rejected { stage: Stage, reason: String },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// A record of one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unique ID for this entry (ULID format)
    pub id: String,

    /// When the operation finished
    pub timestamp: DateTime<Utc>,

    /// Canonical op string (e.g., "create task", "remove column")
    pub op: String,

    /// Task or column the operation addressed, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(flatten)]
    pub outcome: Outcome,

    /// How long the operation took (milliseconds)
    pub duration_ms: u64,
}

impl ActivityEntry {
    pub fn new(
        op: impl Into<String>,
        target: Option<String>,
        outcome: Outcome,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            timestamp: Utc::now(),
            op: op.into(),
            target,
            outcome,
            duration_ms,
        }
    }

    /// Entry for an operation that returned `error`
    pub fn rejected(
        op: impl Into<String>,
        target: Option<String>,
        error: &BoardError,
        duration_ms: u64,
    ) -> Self {
        let outcome = Outcome::Rejected {
            stage: Stage::of(error),
            reason: error.to_string(),
        };
        Self::new(op, target, outcome, duration_ms)
    }
}

/// Newest-first, bounded list of activity entries
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, entry: ActivityEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(ACTIVITY_CAPACITY)
    }
}
