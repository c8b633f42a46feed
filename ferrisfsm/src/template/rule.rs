//! State rules: a line pattern plus the actions to take when it matches.

use std::fmt;

use regex::{Captures, Regex};

/// What to do with the current input line after a rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LineOp {
    /// Finish with this line and read the next one.
    #[default]
    Next,
    /// Keep testing the remaining rules of the state against this line.
    Continue,
    /// Abort the parse, optionally with a message.
    Error(Option<String>),
}

/// What to do with the field buffer after a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOp {
    #[default]
    NoRecord,
    /// Emit the buffer as a row, then reset non-filldown fields.
    Record,
    /// Reset non-filldown fields without emitting.
    Clear,
    /// Reset every field, filldown included.
    Clearall,
}

/// Where the state machine goes after a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Index of a declared state.
    State(usize),
    /// Stop, then apply the template's end-of-input policy.
    Eof,
    /// Stop without any final record.
    End,
}

/// The parsed right-hand side of `->`, before state names are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Action {
    pub line_op: LineOp,
    pub record_op: RecordOp,
    pub new_state: Option<String>,
}

impl Action {
    /// Parse an action such as `Next.Record Start`, `Continue`, `Record`,
    /// `Interfaces` or `Error "bad input"`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::default());
        }

        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };

        let mut action = Self::default();
        let mut is_error = false;

        if let Some((line_word, record_word)) = head.split_once('.') {
            action.line_op = parse_line_op(line_word)
                .ok_or_else(|| format!("unknown line action '{line_word}'"))?;
            action.record_op = parse_record_op(record_word)
                .ok_or_else(|| format!("unknown record action '{record_word}'"))?;
            is_error = matches!(action.line_op, LineOp::Error(_));
        } else if let Some(op) = parse_line_op(head) {
            is_error = matches!(op, LineOp::Error(_));
            action.line_op = op;
        } else if let Some(op) = parse_record_op(head) {
            action.record_op = op;
        } else if rest.is_empty() {
            action.new_state = Some(parse_state_name(head)?);
            return Ok(action);
        } else {
            return Err(format!("unknown action '{head}'"));
        }

        if rest.is_empty() {
            return Ok(action);
        }

        if is_error {
            let message = rest
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
                .unwrap_or(rest);
            action.line_op = LineOp::Error(Some(message.to_string()));
            return Ok(action);
        }

        if action.line_op == LineOp::Continue {
            return Err("'Continue' cannot be combined with a state change".to_string());
        }
        action.new_state = Some(parse_state_name(rest)?);
        Ok(action)
    }
}

fn parse_line_op(word: &str) -> Option<LineOp> {
    match word {
        "Next" => Some(LineOp::Next),
        "Continue" => Some(LineOp::Continue),
        "Error" => Some(LineOp::Error(None)),
        _ => None,
    }
}

fn parse_record_op(word: &str) -> Option<RecordOp> {
    match word {
        "NoRecord" => Some(RecordOp::NoRecord),
        "Record" => Some(RecordOp::Record),
        "Clear" => Some(RecordOp::Clear),
        "Clearall" => Some(RecordOp::Clearall),
        _ => None,
    }
}

fn parse_state_name(word: &str) -> Result<String, String> {
    if is_state_name(word) {
        Ok(word.to_string())
    } else {
        Err(format!("invalid state name '{word}'"))
    }
}

/// State names are word characters only, at most 48 of them.
pub(crate) fn is_state_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 48
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A compiled rule inside a state.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The pattern as written in the template, before value substitution.
    pub source: String,

    /// Compiled pattern with values expanded into named groups.
    pub regex: Regex,

    /// Indices of the template values bound by this rule, in group order.
    pub bindings: Vec<usize>,

    pub line_op: LineOp,

    pub record_op: RecordOp,

    /// Resolved target, `None` to stay in the current state.
    pub transition: Option<Transition>,

    /// Line in the template the rule was declared on.
    pub line: usize,
}

impl Rule {
    /// Match the rule against a line of input.
    pub fn captures<'h>(&self, line: &'h str) -> Option<Captures<'h>> {
        self.regex.captures(line)
    }

    /// Check if the rule matches a line.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Why a value reference could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExpandError {
    /// The name is not a declared value.
    UnknownValue(String),
    /// `${` without a closing brace.
    Unterminated,
}

/// Expand `${NAME}` / `$NAME` references into the values' named groups.
///
/// `$$` is a literal `$`. A `$` not followed by `{`, `$` or a name is kept
/// as-is so that end-of-line anchors written as a bare `$` still work.
/// Returns the expanded pattern and the referenced names in order.
pub(crate) fn expand_values<'a, F>(
    pattern: &str,
    lookup: F,
) -> Result<(String, Vec<String>), ExpandError>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut names = Vec::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek().map(|&(_, next)| next) {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                let start = i + 2;
                let end = pattern[start..]
                    .find('}')
                    .map(|off| start + off)
                    .ok_or(ExpandError::Unterminated)?;
                let name = &pattern[start..end];
                let group =
                    lookup(name).ok_or_else(|| ExpandError::UnknownValue(name.to_string()))?;
                out.push_str(group);
                names.push(name.to_string());
                while chars.peek().is_some_and(|&(j, _)| j <= end) {
                    chars.next();
                }
            }
            Some(next) if next.is_ascii_alphabetic() || next == '_' => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, ch)) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        end = j + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &pattern[start..end];
                let group =
                    lookup(name).ok_or_else(|| ExpandError::UnknownValue(name.to_string()))?;
                out.push_str(group);
                names.push(name.to_string());
            }
            _ => out.push('$'),
        }
    }

    Ok((out, names))
}
