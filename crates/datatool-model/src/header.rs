//! Column headers.

use datatool_core::DatumType;
use serde::{Deserialize, Serialize};

/// A column: 1-based index, unique key, optional display title, and the
/// widest datum type observed in the column so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataHeader {
    index: u32,
    key: String,
    title: Option<String>,
    datum_type: DatumType,
}

impl DataHeader {
    pub fn new(index: u32, key: impl Into<String>) -> Self {
        Self {
            index,
            key: key.into(),
            title: None,
            datum_type: DatumType::Unknown,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, datum_type: DatumType) -> Self {
        self.datum_type = datum_type;
        self
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The title when set, the key otherwise.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn datum_type(&self) -> DatumType {
        self.datum_type
    }

    pub fn set_type(&mut self, datum_type: DatumType) {
        self.datum_type = datum_type;
    }

    /// Widens the column type after seeing a value of `observed` type.
    pub fn observe(&mut self, observed: DatumType) {
        self.datum_type = self.datum_type.promote(observed);
    }
}
