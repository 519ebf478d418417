//! CLI error type

use taskboard_sync::{BoardError, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no owner id: pass --owner or set owner_id in the config")]
    NoOwner,
}

pub type Result<T> = std::result::Result<T, CliError>;
