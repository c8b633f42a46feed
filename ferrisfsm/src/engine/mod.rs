//! Parsing engine: runs a loaded template over raw text.
//!
//! The engine walks the input one line at a time. In the current state each
//! rule is tried in declaration order; the first match assigns its captures,
//! applies its record action and transition, and either moves on to the next
//! line (`Next`) or keeps trying the remaining rules (`Continue`). Lines that
//! match no rule are skipped.
//!
//! All mutable state (field buffer, current state, table) lives inside a
//! single [`parse`] call. The template is only borrowed.

mod buffer;
mod table;

pub use buffer::FieldBuffer;
pub use table::{Cell, Table};

use log::{debug, trace};

use crate::error::ParseError;
use crate::template::{EofPolicy, LineOp, RecordOp, Rule, Template, Transition};

/// Parse raw text with a template.
///
/// # Example
///
/// ```rust
/// use ferrisfsm::Template;
///
/// let template = Template::parse_str(
///     "Value VLAN_ID (\\d+)\nValue NAME (\\S+)\n\nStart\n  ^${VLAN_ID}\\s+${NAME} -> Record\n",
/// )?;
/// let table = ferrisfsm::engine::parse(&template, "10   data\n20   voice\n")?;
/// assert_eq!(table.header(), ["VLAN_ID", "NAME"]);
/// assert_eq!(table.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse(template: &Template, text: &str) -> Result<Table, ParseError> {
    Engine::new(template).run(text)
}

/// How processing of a line ended.
enum Flow {
    /// Read the next line.
    Next,
    /// Stop reading input.
    Stop(Transition),
}

/// A single parse in progress.
struct Engine<'t> {
    template: &'t Template,
    buffer: FieldBuffer<'t>,
    table: Table,

    /// Table column of each value, once it has been captured.
    columns: Vec<Option<usize>>,

    /// Value index of each table column.
    column_values: Vec<usize>,

    /// Index of the current state.
    state: usize,
}

impl<'t> Engine<'t> {
    fn new(template: &'t Template) -> Self {
        Self {
            template,
            buffer: FieldBuffer::new(template.values()),
            table: Table::new(),
            columns: vec![None; template.values().len()],
            column_values: Vec::new(),
            state: template.start,
        }
    }

    fn run(mut self, text: &str) -> Result<Table, ParseError> {
        let mut stopped_by = None;

        for (index, line) in text.lines().enumerate() {
            if let Flow::Stop(transition) = self.process_line(index + 1, line)? {
                stopped_by = Some(transition);
                break;
            }
        }

        if stopped_by != Some(Transition::End)
            && self.template.eof_policy() == EofPolicy::Record
            && self.buffer.is_dirty()
        {
            trace!("End of input with pending fields, recording final row");
            self.record();
        }

        debug!(
            "Parsed {} rows with {} columns",
            self.table.len(),
            self.table.width()
        );
        Ok(self.table)
    }

    fn process_line(&mut self, line_number: usize, line: &str) -> Result<Flow, ParseError> {
        let template = self.template;
        let state = template.state_at(self.state);

        for rule in &state.rules {
            let Some(captures) = rule.captures(line) else {
                continue;
            };
            trace!(
                "State '{}' line {}: matched rule at template line {}",
                state.name,
                line_number,
                rule.line
            );

            for &value_index in &rule.bindings {
                let name = &template.values()[value_index].name;
                if let Some(m) = captures.name(name) {
                    self.assign(value_index, m.as_str());
                }
            }

            if let LineOp::Error(message) = &rule.line_op {
                return Err(ParseError::RuleError {
                    state: state.name.clone(),
                    line_number,
                    line: line.to_string(),
                    message: message
                        .clone()
                        .unwrap_or_else(|| format!("rule '{rule}' rejected the input")),
                });
            }

            self.apply_record_op(rule);

            if let Some(transition) = rule.transition {
                match transition {
                    Transition::State(next) => {
                        if next != self.state {
                            trace!(
                                "Transition '{}' -> '{}'",
                                state.name,
                                template.state_at(next).name
                            );
                        }
                        self.state = next;
                    }
                    Transition::Eof | Transition::End => {
                        trace!("Transition '{}' -> {:?}", state.name, transition);
                        return Ok(Flow::Stop(transition));
                    }
                }
            }

            if rule.line_op != LineOp::Continue {
                break;
            }
        }

        Ok(Flow::Next)
    }

    fn apply_record_op(&mut self, rule: &Rule) {
        match rule.record_op {
            RecordOp::NoRecord => {}
            RecordOp::Record => self.record(),
            RecordOp::Clear => self.buffer.clear(),
            RecordOp::Clearall => self.buffer.clear_all(),
        }
    }

    /// Store a capture, registering the column on first sight.
    fn assign(&mut self, value_index: usize, text: &str) {
        let column = match self.columns[value_index] {
            Some(column) => column,
            None => {
                let name = &self.template.values()[value_index].name;
                let column = self.table.push_column(name.as_str());
                self.columns[value_index] = Some(column);
                self.column_values.push(value_index);
                column
            }
        };

        self.buffer.assign(value_index, text);

        if self.template.values()[value_index].is_fillup() && !text.is_empty() {
            self.fill_up(column, text);
        }
    }

    /// Copy a value into earlier rows until one already has content.
    fn fill_up(&mut self, column: usize, text: &str) {
        for row in self.table.rows_mut().iter_mut().rev() {
            if row.len() <= column {
                row.resize(column + 1, Cell::empty());
            }
            if !row[column].is_empty() {
                break;
            }
            row[column] = Cell::from(text);
        }
    }

    /// Emit the buffer as a row, then clear it.
    fn record(&mut self) {
        if let Some(name) = self.buffer.missing_required() {
            debug!("Dropping row: required value '{}' is empty", name);
            self.buffer.clear();
            return;
        }

        if self.buffer.is_empty() {
            return;
        }

        let row = self
            .column_values
            .iter()
            .map(|&value_index| self.buffer.get(value_index).clone())
            .collect();
        self.table.push_row(row);
        self.buffer.clear();
    }
}
