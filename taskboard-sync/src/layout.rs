//! Durable storage for the column layout
//!
//! The layout is an opaque blob to the store. [`encode_layout`] and
//! [`decode_layout`] convert between a [`ColumnRegistry`] and the JSON
//! document kept in the blob:
//!
//! ```json
//! {"columns":[{"id":"Task Ready","title":"Task Ready"}]}
//! ```

use crate::column::ColumnRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

/// Errors from loading, saving or decoding a layout
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("layout JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed layout: {message}")]
    Malformed { message: String },
}

/// A place the layout blob can be loaded from and saved to
#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// The last saved blob, or `None` if nothing has been saved
    async fn load(&self) -> Result<Option<String>, LayoutError>;

    /// Replace the stored blob
    async fn save(&self, blob: &str) -> Result<(), LayoutError>;
}

#[derive(Serialize)]
struct LayoutRef<'a> {
    columns: &'a ColumnRegistry,
}

#[derive(Deserialize)]
struct LayoutDoc {
    columns: serde_json::Value,
}

/// Serialize columns into the layout document
pub fn encode_layout(columns: &ColumnRegistry) -> Result<String, LayoutError> {
    Ok(serde_json::to_string(&LayoutRef { columns })?)
}

/// Parse a layout document, validating the columns it names
pub fn decode_layout(blob: &str) -> Result<ColumnRegistry, LayoutError> {
    let doc: LayoutDoc = serde_json::from_str(blob)?;
    let columns = serde_json::from_value(doc.columns)?;
    ColumnRegistry::from_columns(columns).map_err(|e| LayoutError::Malformed {
        message: e.to_string(),
    })
}

/// Layout kept in a JSON file
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    path: PathBuf,
}

impl FileLayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LayoutStore for FileLayoutStore {
    async fn load(&self) -> Result<Option<String>, LayoutError> {
        match fs::read_to_string(&self.path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, blob: &str) -> Result<(), LayoutError> {
        atomic_write(&self.path, blob.as_bytes()).await
    }
}

/// Write via a sibling temp file so readers never see a partial layout
async fn atomic_write(path: &Path, content: &[u8]) -> Result<(), LayoutError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;

    // Rename (atomic on same filesystem)
    fs::rename(&temp_path, path).await?;

    Ok(())
}

/// Layout kept in memory, for tests and sessions without a config directory
#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    blob: Mutex<Option<String>>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `blob`
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    /// The current blob
    pub async fn blob(&self) -> Option<String> {
        self.blob.lock().await.clone()
    }
}

#[async_trait]
impl LayoutStore for MemoryLayoutStore {
    async fn load(&self) -> Result<Option<String>, LayoutError> {
        Ok(self.blob.lock().await.clone())
    }

    async fn save(&self, blob: &str) -> Result<(), LayoutError> {
        *self.blob.lock().await = Some(blob.to_string());
        Ok(())
    }
}
