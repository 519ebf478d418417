//! Column registry

mod registry;

pub use registry::{ColumnRegistry, DEFAULT_COLUMN_TITLES};
