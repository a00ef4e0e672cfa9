//! Flat-row table container for schema-less export records.
//!
//! Export chunks carry arbitrary JSON; after flattening each record is a list
//! of (column, value) pairs. The table unions columns across rows, preserving
//! first-seen column order, and leaves holes as nulls.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// One flattened record: (column, value) pairs in encounter order
pub type FlatRow = Vec<(String, Value)>;

/// Column-ordered table of flattened rows
#[derive(Debug, Default)]
pub struct FlatTable {
    columns: Vec<String>,
    index: FxHashMap<String, usize>,
    rows: Vec<Vec<Option<Value>>>,
}

impl FlatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a flattened row. New columns extend the table; a key repeated
    /// within one row keeps the last value.
    pub fn push_row(&mut self, row: FlatRow) {
        let mut cells: Vec<Option<Value>> = vec![None; self.columns.len()];
        for (key, value) in row {
            let idx = match self.index.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = self.columns.len();
                    self.columns.push(key.clone());
                    self.index.insert(key, idx);
                    idx
                }
            };
            if idx >= cells.len() {
                cells.resize(idx + 1, None);
            }
            cells[idx] = Some(value);
        }
        self.rows.push(cells);
    }

    /// Append all rows from an iterator
    pub fn extend(&mut self, rows: impl IntoIterator<Item = FlatRow>) {
        for row in rows {
            self.push_row(row);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value, or `None` when the row predates the column or holds a hole
    pub fn value(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows
            .get(row)?
            .get(col)
            .and_then(|cell| cell.as_ref())
    }

    /// Iterate one column's cells across all rows (holes as `None`)
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = Option<&Value>> {
        self.rows
            .iter()
            .map(move |row| row.get(col).and_then(|cell| cell.as_ref()))
    }
}
