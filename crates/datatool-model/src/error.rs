//! Model-level errors.

use thiserror::Error;

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("database `{0}` already exists")]
    DatabaseExists(String),

    #[error("database `{0}` not found")]
    DatabaseNotFound(String),

    #[error("column `{key}` already defined in database `{database}`")]
    ColumnExists { database: String, key: String },

    #[error("no column with key `{key}` in database `{database}`")]
    ColumnNotFound { database: String, key: String },

    /// A cell references a column index no header describes.
    #[error("no column for index {column} in database `{database}`")]
    NoColumnForIndex { database: String, column: u32 },

    #[error("column index {column} already in use in database `{database}`")]
    ColumnIndexInUse { database: String, column: u32 },

    #[error("row {index} out of range for database `{database}` ({rows} rows)")]
    RowOutOfRange {
        database: String,
        index: usize,
        rows: usize,
    },

    #[error("invalid option `{key}={value}`")]
    InvalidOption { key: String, value: String },

    #[error("unknown option `{key}`")]
    UnknownOption { key: String },
}
