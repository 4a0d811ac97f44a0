//! In-memory block population table.
//!
//! Blocks arrive as a flat CSV export of the cleaned block layer, one row
//! per geographic unit. Grouping and value columns are chosen at runtime by
//! name, so the table is column-addressable: a header list plus rows of
//! typed cells.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::error::AnalysisError;

/// A single table cell. Empty CSV cells load as `Null`; numeric-looking
/// cells load as `Number`; everything else is `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    /// Numeric view of the cell. Absent values contribute zero to sums,
    /// never null-propagate.
    pub fn number(&self) -> f64 {
        match self {
            Cell::Number(v) => *v,
            Cell::Null | Cell::Text(_) => 0.0,
        }
    }

    /// Label view of the cell, for grouping columns. `None` means the row
    /// has no assignment (e.g. a de-annexed block) and forms no group.
    pub fn label(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Text(s) => Some(s.clone()),
            // Ward numbers round-trip through CSV as numerics ("1", "2.0").
            Cell::Number(v) if v.fract() == 0.0 => Some(format!("{}", *v as i64)),
            Cell::Number(v) => Some(v.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// The block population table: column headers plus one row of cells per
/// block. Immutable during analysis; only the preparation pass adds or
/// overwrites columns.
#[derive(Debug, Clone)]
pub struct BlockTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl BlockTable {
    /// Loads a table from a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading block table");
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Loads a table from any CSV reader with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect());
        }

        debug!(columns = columns.len(), rows = rows.len(), "Block table loaded");
        Ok(BlockTable { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of block rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Resolves a column name to its index, or fails with the name that
    /// was missing.
    pub fn column_index(&self, name: &str) -> Result<usize, AnalysisError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AnalysisError::InvalidColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        &self.rows[row][column]
    }

    /// Numeric value at `(row, column)`; null and text cells read as zero.
    pub fn number(&self, row: usize, column: usize) -> f64 {
        self.rows[row][column].number()
    }

    /// Adds a column, or overwrites it if a column of that name exists.
    /// `cells` must have one entry per row.
    pub fn set_column(&mut self, name: &str, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.rows.len());
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, cell) in self.rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
        }
    }

    pub(crate) fn set_cell(&mut self, row: usize, column: usize, cell: Cell) {
        self.rows[row][column] = cell;
    }
}
