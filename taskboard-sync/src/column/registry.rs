//! ColumnRegistry - the ordered set of status buckets

use crate::error::{BoardError, Result};
use crate::types::{Column, ColumnId};
use serde::{Deserialize, Serialize};

/// Titles of the layout used when nothing valid is persisted
pub const DEFAULT_COLUMN_TITLES: [&str; 3] = ["Task Ready", "Needs Review", "Done"];

/// Ordered, never-empty list of columns. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct ColumnRegistry {
    columns: Vec<Column>,
}

impl ColumnRegistry {
    /// Build a registry from persisted columns.
    ///
    /// Rejects an empty list, blank ids or titles, and duplicate ids or titles.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(BoardError::invalid_input(
                "columns",
                "a board needs at least one column",
            ));
        }

        for (i, column) in columns.iter().enumerate() {
            if column.id.as_str().trim().is_empty() || column.title.trim().is_empty() {
                return Err(BoardError::invalid_input(
                    "columns",
                    format!("column {i} has a blank id or title"),
                ));
            }
            let earlier = &columns[..i];
            if earlier
                .iter()
                .any(|c| c.id == column.id || c.title == column.title)
            {
                return Err(BoardError::DuplicateColumn {
                    title: column.title.clone(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Add a column at the end of the board.
    ///
    /// Surrounding whitespace is dropped; the new column's id is the trimmed title.
    pub fn add(&mut self, title: &str) -> Result<Column> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::invalid_input(
                "title",
                "column title cannot be empty",
            ));
        }

        let column = Column::new(title);
        if self
            .columns
            .iter()
            .any(|c| c.title == column.title || c.id == column.id)
        {
            return Err(BoardError::DuplicateColumn {
                title: title.to_string(),
            });
        }

        self.columns.push(column.clone());
        Ok(column)
    }

    /// Remove a column, returning its id so dependent tasks can be migrated.
    ///
    /// Nothing changes when the id is unknown or names the last column.
    pub fn remove(&mut self, id: &ColumnId) -> Result<ColumnId> {
        let index = self
            .columns
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| BoardError::column_not_found(id.as_str()))?;

        if self.columns.len() <= 1 {
            return Err(BoardError::LastColumn {
                id: id.to_string(),
            });
        }

        Ok(self.columns.remove(index).id)
    }

    /// All columns in display order
    pub fn list(&self) -> &[Column] {
        &self.columns
    }

    /// The first column; new and relabelled tasks land here
    pub fn first(&self) -> &Column {
        &self.columns[0]
    }

    /// Look up a column by id
    pub fn get(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    /// Whether `id` is a registered column
    pub fn contains(&self, id: &ColumnId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Never true for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for ColumnRegistry {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMN_TITLES.iter().map(|t| Column::new(*t)).collect(),
        }
    }
}

impl TryFrom<Vec<Column>> for ColumnRegistry {
    type Error = BoardError;

    fn try_from(columns: Vec<Column>) -> Result<Self> {
        Self::from_columns(columns)
    }
}

impl From<ColumnRegistry> for Vec<Column> {
    fn from(registry: ColumnRegistry) -> Self {
        registry.columns
    }
}
