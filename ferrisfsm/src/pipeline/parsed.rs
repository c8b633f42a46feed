//! Detailed pipeline result.

use std::time::Duration;

use crate::engine::Table;
use crate::record::Record;

/// Result of a pipeline run, with the intermediate table kept.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Identifier of the template the index resolved to.
    pub template: String,

    /// Raw engine output.
    pub table: Table,

    /// The table mapped to records.
    pub records: Vec<Record>,

    /// Time taken from resolution to mapping.
    pub elapsed: Duration,
}

impl Parsed {
    pub fn new(template: impl Into<String>, table: Table, elapsed: Duration) -> Self {
        let records = table.to_records();
        Self {
            template: template.into(),
            table,
            records,
            elapsed,
        }
    }

    /// Number of extracted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Drop everything but the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
