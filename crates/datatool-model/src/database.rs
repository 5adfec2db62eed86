//! The database: named, with ordered headers and renumbered rows.

use std::cmp::Ordering;

use datatool_core::{Datum, NumericFormat};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::header::DataHeader;
use crate::row::{DataRow, RowSet};

/// An in-memory database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    name: String,
    headers: Vec<DataHeader>,
    rows: RowSet,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: Vec::new(),
            rows: RowSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> &[DataHeader] {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&DataHeader> {
        self.headers.iter().find(|h| h.key() == key)
    }

    pub fn header_mut(&mut self, key: &str) -> Option<&mut DataHeader> {
        self.headers.iter_mut().find(|h| h.key() == key)
    }

    pub fn header_by_index(&self, column: u32) -> Option<&DataHeader> {
        self.headers.iter().find(|h| h.index() == column)
    }

    fn header_by_index_mut(&mut self, column: u32) -> Option<&mut DataHeader> {
        self.headers.iter_mut().find(|h| h.index() == column)
    }

    pub fn max_column_index(&self) -> u32 {
        self.headers.iter().map(DataHeader::index).max().unwrap_or(0)
    }

    /// Adds a column at the next free index.
    pub fn add_column(&mut self, key: &str) -> Result<&mut DataHeader> {
        let index = self.max_column_index() + 1;
        self.insert_header(DataHeader::new(index, key))
    }

    /// Adds a fully described column; both the key and the index must be
    /// unused.
    pub fn insert_header(&mut self, header: DataHeader) -> Result<&mut DataHeader> {
        if self.header(header.key()).is_some() {
            return Err(ModelError::ColumnExists {
                database: self.name.clone(),
                key: header.key().to_string(),
            });
        }
        if self.header_by_index(header.index()).is_some() {
            return Err(ModelError::ColumnIndexInUse {
                database: self.name.clone(),
                column: header.index(),
            });
        }
        self.headers.push(header);
        Ok(self.headers.last_mut().unwrap_or_else(|| unreachable!()))
    }

    /// Removes a column, scrubbing its cells from every row so no cell
    /// is left pointing at a header that no longer exists.
    pub fn remove_column(&mut self, key: &str) -> Result<DataHeader> {
        let pos = self
            .headers
            .iter()
            .position(|h| h.key() == key)
            .ok_or_else(|| ModelError::ColumnNotFound {
                database: self.name.clone(),
                key: key.to_string(),
            })?;
        let header = self.headers.remove(pos);
        for row in self.rows.iter_mut() {
            row.remove_cell(header.index());
        }
        Ok(header)
    }

    /// Appends an empty row and returns its 1-based index.
    pub fn new_row(&mut self) -> u32 {
        self.rows.push().index()
    }

    /// Inserts an empty row at 0-based position `pos`.
    pub fn insert_row(&mut self, pos: usize) -> Result<u32> {
        let rows = self.rows.len();
        match self.rows.insert(pos) {
            Some(row) => Ok(row.index()),
            None => Err(ModelError::RowOutOfRange {
                database: self.name.clone(),
                index: pos,
                rows,
            }),
        }
    }

    /// Removes the row at 0-based position `pos`.
    pub fn remove_row(&mut self, pos: usize) -> Result<DataRow> {
        let rows = self.rows.len();
        self.rows.remove(pos).ok_or_else(|| ModelError::RowOutOfRange {
            database: self.name.clone(),
            index: pos,
            rows,
        })
    }

    pub fn row(&self, pos: usize) -> Option<&DataRow> {
        self.rows.get(pos)
    }

    pub fn rows(&self) -> impl Iterator<Item = &DataRow> {
        self.rows.iter()
    }

    /// Sets a cell on a 0-based row position. The column must exist; the
    /// column type widens to cover the value.
    pub fn set_entry(&mut self, pos: usize, column: u32, datum: Datum) -> Result<()> {
        let observed = datum.datum_type();
        if self.header_by_index(column).is_none() {
            return Err(ModelError::NoColumnForIndex {
                database: self.name.clone(),
                column,
            });
        }
        let rows = self.rows.len();
        let row = self
            .rows
            .get_mut(pos)
            .ok_or_else(|| ModelError::RowOutOfRange {
                database: self.name.clone(),
                index: pos,
                rows,
            })?;
        row.set_cell(column, datum);
        if let Some(header) = self.header_by_index_mut(column) {
            header.observe(observed);
        }
        Ok(())
    }

    /// Adds a cell to the last row, creating the row when the database
    /// has none and the column when the key is unknown.
    pub fn push_entry(&mut self, key: &str, datum: Datum) -> Result<()> {
        let column = match self.header(key) {
            Some(header) => header.index(),
            None => self.add_column(key)?.index(),
        };
        if self.rows.is_empty() {
            self.rows.push();
        }
        let pos = self.rows.len() - 1;
        self.set_entry(pos, column, datum)
    }

    /// Checks the structural invariant: every cell's column index is
    /// described by a header.
    pub fn validate(&self) -> Result<()> {
        for row in &self.rows {
            for (column, _) in row.cells() {
                if self.header_by_index(column).is_none() {
                    return Err(ModelError::NoColumnForIndex {
                        database: self.name.clone(),
                        column,
                    });
                }
            }
        }
        Ok(())
    }

    /// Stable sort of the rows by one column. Rows without a cell in
    /// that column sort first.
    pub fn sort_by_key(
        &mut self,
        key: &str,
        descending: bool,
        format: &NumericFormat,
    ) -> Result<()> {
        let column = self
            .header(key)
            .ok_or_else(|| ModelError::ColumnNotFound {
                database: self.name.clone(),
                key: key.to_string(),
            })?
            .index();
        self.rows.sort_by(|a, b| {
            let ordering = match (a.cell(column), b.cell(column)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => x.compare(y, format),
            };
            if descending { ordering.reverse() } else { ordering }
        });
        Ok(())
    }

    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// Appends every row of `source`, matching columns by key and
    /// creating the ones this database does not have yet.
    pub fn append_rows_from(&mut self, source: &Database) -> Result<()> {
        for row in source.rows() {
            let pos = self.rows.len();
            self.rows.push();
            for (column, datum) in row.cells() {
                let key = source
                    .header_by_index(column)
                    .ok_or_else(|| ModelError::NoColumnForIndex {
                        database: source.name.clone(),
                        column,
                    })?
                    .key()
                    .to_string();
                let target_column = match self.header(&key) {
                    Some(header) => header.index(),
                    None => self.add_column(&key)?.index(),
                };
                self.set_entry(pos, target_column, datum.clone())?;
            }
        }
        Ok(())
    }
}

/// Counts reported after a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub database: String,
    pub columns: usize,
    pub rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use datatool_core::{DatumCoercer, DatumType};

    fn datum(raw: &str) -> Datum {
        DatumCoercer::default().coerce(raw)
    }

    #[test]
    fn push_entry_creates_column_and_row() {
        let mut db = Database::new("marks");
        db.push_entry("name", datum("zoe")).unwrap();
        db.push_entry("score", datum("42")).unwrap();
        assert_eq!(db.column_count(), 2);
        assert_eq!(db.row_count(), 1);
        assert_eq!(db.header("score").unwrap().index(), 2);
        assert_eq!(db.header("score").unwrap().datum_type(), DatumType::Integer);
    }

    #[test]
    fn column_type_widens_across_rows() {
        let mut db = Database::new("marks");
        db.push_entry("score", datum("42")).unwrap();
        db.new_row();
        db.push_entry("score", datum("42.5")).unwrap();
        assert_eq!(db.header("score").unwrap().datum_type(), DatumType::Decimal);
    }

    #[test]
    fn duplicate_column_is_an_error() {
        let mut db = Database::new("marks");
        db.add_column("score").unwrap();
        assert_eq!(
            db.add_column("score").unwrap_err(),
            ModelError::ColumnExists {
                database: "marks".to_string(),
                key: "score".to_string(),
            }
        );
    }

    #[test]
    fn entry_requires_a_described_column() {
        let mut db = Database::new("marks");
        db.new_row();
        let err = db.set_entry(0, 3, datum("1")).unwrap_err();
        assert_eq!(
            err,
            ModelError::NoColumnForIndex {
                database: "marks".to_string(),
                column: 3,
            }
        );
    }

    #[test]
    fn remove_column_scrubs_cells() {
        let mut db = Database::new("marks");
        db.push_entry("name", datum("zoe")).unwrap();
        db.push_entry("score", datum("42")).unwrap();
        let header = db.remove_column("score").unwrap();
        assert_eq!(header.key(), "score");
        assert!(db.row(0).unwrap().cell(2).is_none());
        db.validate().unwrap();
        assert!(matches!(
            db.remove_column("score"),
            Err(ModelError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn row_indices_stay_in_sync() {
        let mut db = Database::new("marks");
        for _ in 0..3 {
            db.new_row();
        }
        db.insert_row(1).unwrap();
        db.remove_row(0).unwrap();
        let indices: Vec<u32> = db.rows().map(DataRow::index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn sort_numeric_and_missing_first() {
        let fmt = NumericFormat::default();
        let mut db = Database::new("marks");
        db.add_column("score").unwrap();
        for raw in ["10", "2"] {
            db.new_row();
            db.push_entry("score", datum(raw)).unwrap();
        }
        db.new_row();
        db.sort_by_key("score", false, &fmt).unwrap();
        assert!(db.row(0).unwrap().cell(1).is_none());
        assert_eq!(db.row(1).unwrap().cell(1).unwrap().numeric_value(), Some(2.0));
        assert_eq!(db.row(2).unwrap().cell(1).unwrap().numeric_value(), Some(10.0));
    }

    #[test]
    fn sort_descending() {
        let fmt = NumericFormat::default();
        let mut db = Database::new("marks");
        db.add_column("score").unwrap();
        for raw in ["2", "10"] {
            db.new_row();
            db.push_entry("score", datum(raw)).unwrap();
        }
        db.sort_by_key("score", true, &fmt).unwrap();
        assert_eq!(db.row(0).unwrap().cell(1).unwrap().numeric_value(), Some(10.0));
    }

    #[test]
    fn serializes_for_inspection() {
        let mut db = Database::new("marks");
        db.push_entry("score", datum("42")).unwrap();
        let json = serde_json::to_value(&db).unwrap();
        assert_eq!(json["name"], "marks");
        assert_eq!(json["rows"][0]["cells"]["1"]["kind"], "integer");
        let back: Database = serde_json::from_value(json).unwrap();
        assert_eq!(back, db);
    }

    #[test]
    fn unknown_sort_key() {
        let fmt = NumericFormat::default();
        let mut db = Database::new("marks");
        assert!(matches!(
            db.sort_by_key("missing", false, &fmt),
            Err(ModelError::ColumnNotFound { .. })
        ));
    }
}
