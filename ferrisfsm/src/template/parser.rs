//! Loader for the text form of templates.
//!
//! The text form is a `Value` section followed by state blocks:
//!
//! ```text
//! Value Filldown CHASSIS (\S+)
//! Value Required PORT (\S+)
//!
//! Start
//!   ^Chassis ${CHASSIS}
//!   ^${PORT}\s+up -> Record
//! ```
//!
//! Everything that can be checked without input is checked here: option
//! names, value and rule patterns, value references, state names and
//! transition targets.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use super::rule::{expand_values, is_state_name, Action, ExpandError, Rule, Transition};
use super::value::{ValueDef, ValueOptions};
use super::{EofPolicy, State, Template, END_STATE, EOF_STATE, START_STATE};
use crate::error::TemplateError;

/// A rule whose target state has not been resolved yet.
struct PendingRule {
    rule: Rule,
    target: Option<String>,
}

/// A state block as written, before reserved names are split out.
struct PendingState {
    name: String,
    line: usize,
    rules: Vec<PendingRule>,
}

pub(super) fn parse(text: &str) -> Result<Template, TemplateError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l)).peekable();

    // Value section: ends at the first blank line after a value, or at the
    // first line that is not a value declaration.
    let mut values: Vec<ValueDef> = Vec::new();
    while let Some(&(line_no, line)) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            lines.next();
            continue;
        }
        if trimmed.is_empty() {
            lines.next();
            if values.is_empty() {
                continue;
            }
            break;
        }
        if !line.starts_with("Value ") {
            break;
        }

        let value = parse_value_line(line_no, line)?;
        if values
            .iter()
            .any(|v| v.name.eq_ignore_ascii_case(&value.name))
        {
            return Err(TemplateError::DuplicateValue {
                line: line_no,
                name: value.name,
            });
        }
        values.push(value);
        lines.next();
    }

    let groups: HashMap<String, String> = values
        .iter()
        .map(|v| (v.name.clone(), v.capture_group()))
        .collect();
    let value_index: HashMap<&str, usize> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v.name.as_str(), i))
        .collect();

    // State section.
    let mut pending: Vec<PendingState> = Vec::new();
    let mut current: Option<PendingState> = None;
    for (line_no, line) in lines {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed.is_empty() {
            if let Some(state) = current.take() {
                pending.push(state);
            }
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            let state = current.as_mut().ok_or_else(|| TemplateError::Syntax {
                line: line_no,
                message: "rule outside of a state".to_string(),
            })?;
            let rule = parse_rule_line(line_no, trimmed, &groups, &value_index)?;
            state.rules.push(rule);
            continue;
        }

        if let Some(state) = current.take() {
            pending.push(state);
        }
        if !is_state_name(trimmed) {
            return Err(TemplateError::Syntax {
                line: line_no,
                message: format!("invalid state name '{trimmed}'"),
            });
        }
        if pending.iter().any(|s| s.name == trimmed) {
            return Err(TemplateError::DuplicateState {
                line: line_no,
                name: trimmed.to_string(),
            });
        }
        current = Some(PendingState {
            name: trimmed.to_string(),
            line: line_no,
            rules: Vec::new(),
        });
    }
    if let Some(state) = current.take() {
        pending.push(state);
    }

    // Reserved states carry no rules; an empty EOF state switches off the
    // implicit final record.
    let mut eof_policy = EofPolicy::Record;
    let mut declared: Vec<PendingState> = Vec::with_capacity(pending.len());
    for state in pending {
        if state.name == EOF_STATE || state.name == END_STATE {
            if !state.rules.is_empty() {
                return Err(TemplateError::Syntax {
                    line: state.line,
                    message: format!("reserved state '{}' must not contain rules", state.name),
                });
            }
            if state.name == EOF_STATE {
                eof_policy = EofPolicy::Discard;
            }
            continue;
        }
        declared.push(state);
    }

    if declared.is_empty() {
        return Err(TemplateError::NoStates);
    }

    let names: Vec<String> = declared.iter().map(|s| s.name.clone()).collect();
    let mut states = IndexMap::with_capacity(declared.len());
    for state in declared {
        let mut rules = Vec::with_capacity(state.rules.len());
        for PendingRule { mut rule, target } in state.rules {
            rule.transition = match target.as_deref() {
                None => None,
                Some(EOF_STATE) => Some(Transition::Eof),
                Some(END_STATE) => Some(Transition::End),
                Some(name) => {
                    let index = names.iter().position(|n| n == name).ok_or_else(|| {
                        TemplateError::UnknownState {
                            line: rule.line,
                            name: name.to_string(),
                        }
                    })?;
                    Some(Transition::State(index))
                }
            };
            rules.push(rule);
        }
        states.insert(
            state.name.clone(),
            State {
                name: state.name,
                rules,
            },
        );
    }

    let start = states.get_index_of(START_STATE).unwrap_or(0);

    debug!(
        "Loaded template: {} values, {} states, start '{}', eof policy {:?}",
        values.len(),
        states.len(),
        names[start],
        eof_policy
    );

    Ok(Template {
        values,
        states,
        start,
        eof_policy,
    })
}

/// Parse `Value [Options] NAME (regex)`.
fn parse_value_line(line_no: usize, line: &str) -> Result<ValueDef, TemplateError> {
    let syntax = |message: String| TemplateError::Syntax {
        line: line_no,
        message,
    };

    let rest = line["Value".len()..].trim_start();
    let (first, after_first) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| syntax("value needs a name and a pattern".to_string()))?;
    let after_first = after_first.trim_start();

    let (options, name, pattern) = if after_first.starts_with('(') {
        (None, first, after_first)
    } else {
        let (name, pattern) = after_first
            .split_once(char::is_whitespace)
            .ok_or_else(|| syntax("value needs a name and a pattern".to_string()))?;
        (Some(first), name, pattern.trim_start())
    };

    let mut value = ValueDef::new(name, pattern.trim_end()).map_err(syntax)?;
    if let Some(options) = options {
        value = value.with_options(ValueOptions::parse(options).map_err(syntax)?);
    }
    value
        .validate()
        .map_err(|source| TemplateError::InvalidPattern {
            line: line_no,
            source,
        })?;

    Ok(value)
}

/// Parse a trimmed rule line `^pattern [-> action]`.
fn parse_rule_line(
    line_no: usize,
    rule_text: &str,
    groups: &HashMap<String, String>,
    value_index: &HashMap<&str, usize>,
) -> Result<PendingRule, TemplateError> {
    if !rule_text.starts_with('^') {
        return Err(TemplateError::Syntax {
            line: line_no,
            message: format!("rule must start with '^': '{rule_text}'"),
        });
    }

    let (pattern, action_text) = split_action(rule_text);
    let action = Action::parse(action_text.unwrap_or("")).map_err(|message| {
        TemplateError::Syntax {
            line: line_no,
            message,
        }
    })?;

    let (expanded, _) = expand_values(pattern, |name| groups.get(name).map(String::as_str))
        .map_err(|err| match err {
            ExpandError::UnknownValue(name) => TemplateError::UnknownValue {
                line: line_no,
                name,
            },
            ExpandError::Unterminated => TemplateError::Syntax {
                line: line_no,
                message: format!("unterminated value reference in '{pattern}'"),
            },
        })?;

    let regex = Regex::new(&expanded).map_err(|source| TemplateError::InvalidPattern {
        line: line_no,
        source,
    })?;

    let bindings = regex
        .capture_names()
        .flatten()
        .filter_map(|name| value_index.get(name).copied())
        .collect();

    Ok(PendingRule {
        rule: Rule {
            source: pattern.to_string(),
            regex,
            bindings,
            line_op: action.line_op,
            record_op: action.record_op,
            transition: None,
            line: line_no,
        },
        target: action.new_state,
    })
}

/// Split a rule at its last `->` that follows whitespace.
fn split_action(rule_text: &str) -> (&str, Option<&str>) {
    for (idx, _) in rule_text.rmatch_indices("->") {
        let before = &rule_text[..idx];
        if before.ends_with(char::is_whitespace) {
            return (before.trim_end(), Some(rule_text[idx + 2..].trim()));
        }
    }
    (rule_text.trim_end(), None)
}
