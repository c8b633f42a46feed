//! Tabular parse result.

use std::fmt;

use serde::Serialize;

/// One cell of a row: text, or a list of texts for `List` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    List(Vec<String>),
}

impl Cell {
    /// An empty text cell.
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    /// Check whether the cell holds nothing (empty text or empty list).
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Text(s) => s.is_empty(),
            Cell::List(items) => items.is_empty(),
        }
    }

    /// The text of a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::List(_) => None,
        }
    }

    /// The items of a list cell.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Cell::Text(_) => None,
            Cell::List(items) => Some(items),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::empty()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl PartialEq<str> for Cell {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Cell {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Vec<String>> for Cell {
    fn from(items: Vec<String>) -> Self {
        Cell::List(items)
    }
}

/// Header plus rows produced by one parse.
///
/// The header only grows; a column's position never changes once assigned.
/// Rows keep the width the header had when they were emitted, so early rows
/// may be shorter than the final header. Use [`Table::padded_row`] or the
/// record mapper to get full-width views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Column names in first-capture order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rows as emitted.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Position of a column by name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// A row padded with empty cells to the full header width.
    pub fn padded_row(&self, index: usize) -> Option<Vec<Cell>> {
        self.rows.get(index).map(|row| {
            let mut row = row.clone();
            row.resize(self.header.len(), Cell::empty());
            row
        })
    }

    /// Append a column and return its position.
    pub(crate) fn push_column(&mut self, name: impl Into<String>) -> usize {
        self.header.push(name.into());
        self.header.len() - 1
    }

    pub(crate) fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert!(row.len() <= self.header.len());
        self.rows.push(row);
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Cell>] {
        &mut self.rows
    }
}
