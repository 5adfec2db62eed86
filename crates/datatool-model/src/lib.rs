//! Database model: headers, rows, databases, the database context, and
//! the I/O settings that drive the file-format crates.

pub mod context;
pub mod database;
pub mod error;
pub mod header;
pub mod row;
pub mod settings;

pub use context::DataContext;
pub use database::{Database, LoadSummary};
pub use error::{ModelError, Result};
pub use header::DataHeader;
pub use row::{DataRow, RowSet};
pub use settings::{
    AddDelimiter, CsvBlank, CsvContent, EscapeChars, Expand, FileFormat, FormatVersion,
    IoSettings, LoadAction, Overwrite,
};
