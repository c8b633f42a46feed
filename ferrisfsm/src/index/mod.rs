//! Template index: maps attribute constraints to template identifiers.
//!
//! # Index Format
//!
//! One rule per line: the template identifier, then comma-separated
//! `name=pattern` constraints. The identifier may also be written as a
//! `Template=` field anywhere in the row:
//!
//! ```text
//! # comments and blank lines are ignored
//! cisco_ios_show_vlan.textfsm, Vendor=cisco_ios, Command=sh[[ow]] vl[[an]]
//! Template=arista_eos_show_version.textfsm, Vendor=arista_eos, Command=sh[[ow]] ver[[sion]]
//! ```
//!
//! A header line of bare names starting with `Template` is skipped. Rows under
//! it may keep the `name=pattern` form, or drop the names and list one pattern
//! per header column; an empty column is a wildcard:
//!
//! ```text
//! Template, Vendor, Command
//! cisco_ios_show_vlan.textfsm, cisco_ios, sh[[ow]] vl[[an]]
//! generic_show_version.textfsm, , sh[[ow]] ver[[sion]]
//! ```
//!
//! Fields may be double-quoted to carry commas.

mod attributes;
mod rule;

pub use attributes::Attributes;
pub use rule::{expand_completion, Constraint, IndexRule};

use log::{debug, trace};

use crate::error::IndexError;

/// Name of the field holding the template identifier.
pub const TEMPLATE_FIELD: &str = "Template";

/// An ordered list of index rules.
#[derive(Debug, Clone, Default)]
pub struct Index {
    rules: Vec<IndexRule>,
}

impl Index {
    /// Create an index from already-built rules.
    pub fn new(rules: Vec<IndexRule>) -> Self {
        Self { rules }
    }

    /// Parse an index from its text form.
    pub fn parse_str(text: &str) -> Result<Self, IndexError> {
        let mut rules = Vec::new();
        let mut header: Option<Vec<String>> = None;

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields = split_fields(line);
            if header.is_none() && rules.is_empty() && is_header(&fields) {
                trace!("Index header at line {}: {:?}", line_no, fields);
                header = Some(fields);
                continue;
            }

            let rule = match &header {
                Some(columns) if !is_keyed_row(columns, &fields) => {
                    parse_positional(line_no, columns, fields)?
                }
                _ => parse_keyed(line_no, fields)?,
            };
            rules.push(rule);
        }

        debug!("Loaded index with {} rules", rules.len());
        Ok(Self { rules })
    }

    /// Find the template for a set of attributes.
    ///
    /// Every constraint of a rule must match; the matching rule with the most
    /// constraints wins, and the earliest rule wins a tie.
    pub fn resolve<'a>(&'a self, attributes: &Attributes) -> Option<&'a IndexRule> {
        let mut best: Option<&IndexRule> = None;
        for rule in self.matching(attributes) {
            if best.is_none_or(|b| rule.specificity() > b.specificity()) {
                best = Some(rule);
            }
        }
        best
    }

    /// All rules matching the attributes, in index order.
    pub fn matching<'a, 'b>(
        &'a self,
        attributes: &'b Attributes,
    ) -> impl Iterator<Item = &'a IndexRule> + use<'a, 'b> {
        self.rules.iter().filter(move |rule| rule.matches(attributes))
    }

    /// All rules in index order.
    pub fn rules(&self) -> &[IndexRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn is_header(fields: &[String]) -> bool {
    fields
        .first()
        .is_some_and(|f| f.eq_ignore_ascii_case(TEMPLATE_FIELD))
        && fields.iter().all(|f| !f.contains('='))
}

/// Whether a row under a header still spells out `Name=pattern` for every
/// constraint, naming header columns.
fn is_keyed_row(columns: &[String], fields: &[String]) -> bool {
    fields.len() > 1
        && fields[1..].iter().all(|field| {
            field
                .split_once('=')
                .is_some_and(|(name, _)| columns.iter().any(|c| c == name.trim()))
        })
}

/// Parse `id, Name=pattern, ...` or `Template=id, Name=pattern, ...`.
fn parse_keyed(line: usize, fields: Vec<String>) -> Result<IndexRule, IndexError> {
    let mut template = None;
    let mut constraints = Vec::new();

    for (i, field) in fields.into_iter().enumerate() {
        let Some((name, pattern)) = field.split_once('=') else {
            if i == 0 {
                template = Some(field);
                continue;
            }
            return Err(IndexError::MalformedField { line, field });
        };
        let (name, pattern) = (name.trim(), pattern.trim());
        if name.is_empty() {
            return Err(IndexError::MalformedField { line, field });
        }

        if name.eq_ignore_ascii_case(TEMPLATE_FIELD) {
            template = Some(pattern.to_string());
        } else if !pattern.is_empty() {
            constraints.push(compile(line, name, pattern)?);
        }
    }

    finish(line, template, constraints)
}

/// Parse a row under a `Template, Name, ...` header.
fn parse_positional(
    line: usize,
    columns: &[String],
    mut fields: Vec<String>,
) -> Result<IndexRule, IndexError> {
    if fields.len() > columns.len() {
        return Err(IndexError::MalformedField {
            line,
            field: fields.swap_remove(columns.len()),
        });
    }

    let template = fields.first().cloned();
    let mut constraints = Vec::new();
    for (name, pattern) in columns.iter().zip(&fields).skip(1) {
        if !pattern.is_empty() {
            constraints.push(compile(line, name, pattern)?);
        }
    }

    finish(line, template, constraints)
}

fn compile(line: usize, name: &str, pattern: &str) -> Result<Constraint, IndexError> {
    Constraint::new(name, pattern).map_err(|source| IndexError::InvalidPattern {
        line,
        attribute: name.to_string(),
        source,
    })
}

fn finish(
    line: usize,
    template: Option<String>,
    constraints: Vec<Constraint>,
) -> Result<IndexRule, IndexError> {
    let template = template
        .filter(|t| !t.is_empty())
        .ok_or(IndexError::MissingTemplate { line })?;
    if constraints.is_empty() {
        return Err(IndexError::NoConstraints { line, template });
    }
    Ok(IndexRule {
        template,
        constraints,
        line,
    })
}

/// Split a line on commas outside double quotes; quotes are dropped and
/// fields trimmed.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}
