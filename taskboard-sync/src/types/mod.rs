//! Core types for the board engine

mod board;
mod ids;
mod instant;
mod task;

// Re-export all types
pub use board::{BoardState, Column};
pub use ids::{ColumnId, OwnerId, TaskId};
pub use instant::parse_instant;
pub use task::Task;
