//! Rows and the renumbering row collection.

use std::collections::BTreeMap;

use datatool_core::Datum;
use serde::{Deserialize, Serialize};

/// One row: its 1-based index and cells keyed by column index. Sparse
/// rows are legal; a missing cell reads as no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    index: u32,
    cells: BTreeMap<u32, Datum>,
}

impl DataRow {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            cells: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    pub fn cell(&self, column: u32) -> Option<&Datum> {
        self.cells.get(&column)
    }

    pub fn set_cell(&mut self, column: u32, datum: Datum) {
        self.cells.insert(column, datum);
    }

    pub fn remove_cell(&mut self, column: u32) -> Option<Datum> {
        self.cells.remove(&column)
    }

    /// Cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, &Datum)> {
        self.cells.iter().map(|(&column, datum)| (column, datum))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn max_column_index(&self) -> u32 {
        self.cells.keys().next_back().copied().unwrap_or(0)
    }
}

/// Row collection that keeps row indices eagerly in sync: after any
/// mutation, the row at position `i` has index `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSet {
    rows: Vec<DataRow>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a fresh row and returns it.
    pub fn push(&mut self) -> &mut DataRow {
        let index = self.rows.len() as u32 + 1;
        self.rows.push(DataRow::new(index));
        self.rows.last_mut().unwrap_or_else(|| unreachable!())
    }

    /// Inserts a fresh row at 0-based position `pos`, shifting and
    /// renumbering the rest. `pos` may equal `len`.
    pub fn insert(&mut self, pos: usize) -> Option<&mut DataRow> {
        if pos > self.rows.len() {
            return None;
        }
        self.rows.insert(pos, DataRow::new(0));
        self.renumber();
        self.rows.get_mut(pos)
    }

    /// Removes the row at 0-based position `pos`, renumbering the rest.
    pub fn remove(&mut self, pos: usize) -> Option<DataRow> {
        if pos >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(pos);
        self.renumber();
        Some(row)
    }

    pub fn get(&self, pos: usize) -> Option<&DataRow> {
        self.rows.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut DataRow> {
        self.rows.get_mut(pos)
    }

    pub fn last_mut(&mut self) -> Option<&mut DataRow> {
        self.rows.last_mut()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataRow> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DataRow> {
        self.rows.iter_mut()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Stable sort by a row comparator, then renumber.
    pub fn sort_by(&mut self, cmp: impl FnMut(&DataRow, &DataRow) -> std::cmp::Ordering) {
        self.rows.sort_by(cmp);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.set_index(i as u32 + 1);
        }
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a DataRow;
    type IntoIter = std::slice::Iter<'a, DataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(rows: &RowSet) -> Vec<u32> {
        rows.iter().map(DataRow::index).collect()
    }

    #[test]
    fn push_numbers_from_one() {
        let mut rows = RowSet::new();
        rows.push();
        rows.push();
        rows.push();
        assert_eq!(indices(&rows), vec![1, 2, 3]);
    }

    #[test]
    fn insert_renumbers() {
        let mut rows = RowSet::new();
        rows.push().set_cell(1, Datum::Unknown);
        rows.push();
        rows.insert(1).unwrap();
        assert_eq!(indices(&rows), vec![1, 2, 3]);
        assert!(rows.get(1).unwrap().is_empty());
        assert!(rows.insert(9).is_none());
    }

    #[test]
    fn remove_renumbers() {
        let mut rows = RowSet::new();
        for _ in 0..4 {
            rows.push();
        }
        rows.remove(1).unwrap();
        assert_eq!(indices(&rows), vec![1, 2, 3]);
        assert!(rows.remove(7).is_none());
    }
}
