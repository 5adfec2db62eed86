//! Delimited-text support: the row tokenizer and the CSV/TSV reader and
//! writer built on it.

pub mod error;
pub mod reader;
pub mod tokenizer;
pub mod writer;

pub use error::{CsvError, Result};
pub use reader::{CsvReader, read_csv};
pub use tokenizer::{RowScanner, is_blank_row};
pub use writer::{CsvWriter, write_csv};
