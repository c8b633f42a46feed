//! Record mapper: turns a [`Table`] into field-name keyed records.

use std::ops::Index;

use indexmap::IndexMap;
use serde::Serialize;

use crate::engine::{Cell, Table};

/// One extracted row keyed by lower-cased column name, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Cell>);

impl Record {
    /// Get a field by its lower-cased name.
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.0.get(name)
    }

    /// Get a text field by its lower-cased name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Cell::as_str)
    }

    /// Check if a field exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Field names in header order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Fields in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Cell)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the underlying ordered map.
    pub fn into_inner(self) -> IndexMap<String, Cell> {
        self.0
    }
}

impl Index<&str> for Record {
    type Output = Cell;

    /// Panics if the field does not exist, like map indexing.
    fn index(&self, name: &str) -> &Cell {
        &self.0[name]
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Cell);
    type IntoIter = indexmap::map::Iter<'a, String, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Map every row of a table to a record.
///
/// Columns a row predates are filled with empty strings, so every record has
/// every header, in header order.
pub fn to_records(table: &Table) -> Vec<Record> {
    let keys: Vec<String> = table.header().iter().map(|h| h.to_lowercase()).collect();

    table
        .rows()
        .iter()
        .map(|row| {
            let fields = keys
                .iter()
                .enumerate()
                .map(|(i, key)| (key.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect();
            Record(fields)
        })
        .collect()
}

impl Table {
    /// Map the table to records, see [`to_records`].
    pub fn to_records(&self) -> Vec<Record> {
        to_records(self)
    }
}
