//! Core value model: typed datums, Julian temporal values, locale-aware
//! numeric formatting, and the coercion engine that turns raw cell text
//! into typed values.
//!
//! This crate is the leaf of the workspace; the database model and the
//! file-format crates build on it.

pub mod coerce;
pub mod datum;
pub mod error;
pub mod julian;
pub mod numfmt;

pub use coerce::{DEFAULT_CURRENCY_SYMBOLS, DatumCoercer};
pub use datum::{Datum, DatumType};
pub use error::{JulianError, NumericError};
pub use julian::{DayOfWeek, Julian};
pub use numfmt::NumericFormat;
