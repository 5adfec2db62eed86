//! Error types for datum parsing and temporal values.

use thiserror::Error;

/// Errors produced while parsing a temporal value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JulianError {
    /// The date component is malformed or out of range.
    #[error("invalid date in temporal value `{0}`")]
    InvalidDate(String),

    /// The time component is malformed or out of range.
    #[error("invalid time in temporal value `{0}`")]
    InvalidTime(String),

    /// The time zone suffix is malformed.
    #[error("invalid time zone in temporal value `{0}`")]
    InvalidZone(String),

    /// The text does not look like a temporal value at all.
    #[error("not a temporal value: `{0}`")]
    NotTemporal(String),
}

/// Errors produced by locale-aware numeric parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericError {
    /// The text is not an integer in the active format.
    #[error("`{0}` is not an integer")]
    NotInteger(String),

    /// The text is not a decimal number in the active format.
    #[error("`{0}` is not a number")]
    NotDecimal(String),
}
