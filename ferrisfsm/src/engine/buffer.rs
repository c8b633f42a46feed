//! Field buffer holding the values captured for the row being built.
//!
//! Option semantics live here and are evaluated per field when the buffer is
//! recorded or cleared:
//! - `List` values accumulate instead of overwriting.
//! - `Filldown` values survive `Record` and `Clear`, only `Clearall` resets them.
//!   An empty capture does not overwrite a filldown value.
//! - `Required` values veto a row while empty.

use crate::template::ValueDef;

use super::table::Cell;

/// Buffer for the fields of the row currently being built.
#[derive(Debug)]
pub struct FieldBuffer<'t> {
    /// Value definitions, indexed like `cells`.
    values: &'t [ValueDef],

    /// Current content per value.
    cells: Vec<Cell>,

    /// Whether anything was captured since the last record or clear.
    dirty: bool,
}

impl<'t> FieldBuffer<'t> {
    /// Create an empty buffer for a template's values.
    pub fn new(values: &'t [ValueDef]) -> Self {
        Self {
            values,
            cells: values.iter().map(empty_cell).collect(),
            dirty: false,
        }
    }

    /// Store a captured string for a value.
    pub fn assign(&mut self, index: usize, text: &str) {
        let value = &self.values[index];
        match &mut self.cells[index] {
            Cell::List(items) => items.push(text.to_string()),
            Cell::Text(current) => {
                if value.is_filldown() && text.is_empty() {
                    return;
                }
                *current = text.to_string();
            }
        }
        self.dirty = true;
    }

    /// Current content of a value.
    pub fn get(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    /// Whether anything was captured since the last record or clear.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether every value is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    /// Name of the first `Required` value that is still empty.
    pub fn missing_required(&self) -> Option<&'t str> {
        self.values
            .iter()
            .zip(&self.cells)
            .find(|(value, cell)| value.is_required() && cell.is_empty())
            .map(|(value, _)| value.name.as_str())
    }

    /// Reset every non-filldown value.
    pub fn clear(&mut self) {
        for (value, cell) in self.values.iter().zip(self.cells.iter_mut()) {
            if !value.is_filldown() {
                *cell = empty_cell(value);
            }
        }
        self.dirty = false;
    }

    /// Reset every value, filldown included.
    pub fn clear_all(&mut self) {
        for (value, cell) in self.values.iter().zip(self.cells.iter_mut()) {
            *cell = empty_cell(value);
        }
        self.dirty = false;
    }
}

fn empty_cell(value: &ValueDef) -> Cell {
    if value.is_list() {
        Cell::List(Vec::new())
    } else {
        Cell::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ValueOptions;

    fn values() -> Vec<ValueDef> {
        vec![
            ValueDef::new("CHASSIS", r"(\S+)").unwrap().with_options(ValueOptions {
                filldown: true,
                ..Default::default()
            }),
            ValueDef::new("PORT", r"(\S+)").unwrap().with_options(ValueOptions {
                required: true,
                ..Default::default()
            }),
            ValueDef::new("VLANS", r"(\d+)").unwrap().with_options(ValueOptions {
                list: true,
                ..Default::default()
            }),
        ]
    }

    #[test]
    fn test_assign_and_dirty() {
        let values = values();
        let mut buffer = FieldBuffer::new(&values);
        assert!(!buffer.is_dirty());
        assert!(buffer.is_empty());

        buffer.assign(1, "Gi0/1");
        assert!(buffer.is_dirty());
        assert_eq!(buffer.get(1), &Cell::from("Gi0/1"));
    }

    #[test]
    fn test_list_accumulates() {
        let values = values();
        let mut buffer = FieldBuffer::new(&values);
        buffer.assign(2, "10");
        buffer.assign(2, "20");
        assert_eq!(
            buffer.get(2),
            &Cell::List(vec!["10".to_string(), "20".to_string()])
        );

        buffer.clear();
        assert_eq!(buffer.get(2), &Cell::List(vec![]));
    }

    #[test]
    fn test_filldown_survives_clear() {
        let values = values();
        let mut buffer = FieldBuffer::new(&values);
        buffer.assign(0, "chassis-1");
        buffer.assign(1, "Gi0/1");

        buffer.clear();
        assert_eq!(buffer.get(0), &Cell::from("chassis-1"));
        assert!(buffer.get(1).is_empty());
        assert!(!buffer.is_dirty());

        // Empty captures do not wipe a filldown value
        buffer.assign(0, "");
        assert_eq!(buffer.get(0), &Cell::from("chassis-1"));

        buffer.clear_all();
        assert!(buffer.get(0).is_empty());
    }

    #[test]
    fn test_missing_required() {
        let values = values();
        let mut buffer = FieldBuffer::new(&values);
        buffer.assign(0, "chassis-1");
        assert_eq!(buffer.missing_required(), Some("PORT"));

        buffer.assign(1, "Gi0/1");
        assert_eq!(buffer.missing_required(), None);
    }
}
