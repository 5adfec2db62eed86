//! CSV/TSV read and write errors.

use std::path::PathBuf;

use datatool_model::ModelError;
use thiserror::Error;

pub type Result<T, E = CsvError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("refusing to overwrite existing file: {0}")]
    OverwriteForbidden(PathBuf),

    /// End of input inside a delimited field.
    #[error("unexpected end of file inside a delimited field")]
    UnterminatedField,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
