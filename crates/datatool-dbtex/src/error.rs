//! Errors for the persisted token formats.

use std::path::PathBuf;

use datatool_model::ModelError;
use thiserror::Error;

pub type Result<T, E = DbtexError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbtexError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("refusing to overwrite existing file: {0}")]
    OverwriteForbidden(PathBuf),

    /// The first line is not a `% DBTEX ...` / `% DTLTEX ...` identifier.
    #[error("not a recognized database file (missing format identifier line)")]
    MissingIdentifier,

    #[error("expected `{expected}`, found `{found}`")]
    Expected { expected: String, found: String },

    /// The repeated begin/end index pair around a block disagrees.
    #[error("mismatched markers: expected `{expected}`, found `{found}`")]
    MismatchedMarker { expected: String, found: String },

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("unknown datum type id {0}")]
    UnknownTypeId(i64),

    #[error("cannot write format {0:?} as a token file")]
    NotTokenFormat(datatool_model::FileFormat),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
