//! Pattern templates.
//!
//! A template declares the values it can capture and a set of named states,
//! each holding an ordered list of rules. Templates are parsed and validated
//! once (see [`Template::parse_str`]) and are read-only afterwards, so one
//! loaded template can be shared between any number of parses.
//!
//! # Template Example
//!
//! ```text
//! Value VLAN_ID (\d+)
//! Value NAME (\S+)
//!
//! Start
//!   ^${VLAN_ID}\s+${NAME} -> Record
//! ```

mod parser;
mod rule;
mod value;

pub use rule::{Action, LineOp, RecordOp, Rule, Transition};
pub use value::{ValueDef, ValueOption, ValueOptions};

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// Name of the reserved state that ends processing with the end-of-input policy.
pub const EOF_STATE: &str = "EOF";

/// Name of the reserved state that ends processing without a final record.
pub const END_STATE: &str = "End";

/// Name of the conventional start state.
pub const START_STATE: &str = "Start";

/// What happens to captured but unrecorded fields when input runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EofPolicy {
    /// Emit them as a final row.
    #[default]
    Record,
    /// Drop them.
    Discard,
}

/// A named state and its rules, in declaration order.
#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
    pub rules: Vec<Rule>,
}

/// A compiled pattern template.
#[derive(Clone)]
pub struct Template {
    /// Declared values, in declaration order.
    pub(crate) values: Vec<ValueDef>,

    /// Declared states, excluding the reserved `EOF` and `End`.
    pub(crate) states: IndexMap<String, State>,

    /// Index into `states` where parsing begins.
    pub(crate) start: usize,

    pub(crate) eof_policy: EofPolicy,
}

impl Template {
    /// Parse and validate a template from its text form.
    pub fn parse_str(text: &str) -> Result<Self, TemplateError> {
        parser::parse(text)
    }

    /// Override the end-of-input policy.
    pub fn with_eof_policy(mut self, policy: EofPolicy) -> Self {
        self.eof_policy = policy;
        self
    }

    pub fn eof_policy(&self) -> EofPolicy {
        self.eof_policy
    }

    /// Declared values in declaration order.
    pub fn values(&self) -> &[ValueDef] {
        &self.values
    }

    /// Get a value by name.
    pub fn value(&self, name: &str) -> Option<&ValueDef> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Declared value names in declaration order.
    pub fn value_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.name.as_str())
    }

    /// Names of values flagged `Key`.
    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|v| v.is_key())
            .map(|v| v.name.as_str())
    }

    /// Get a state by name.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// All declared state names, in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &String> {
        self.states.keys()
    }

    /// The state parsing begins in.
    pub fn start_state(&self) -> &State {
        &self.states[self.start]
    }

    pub(crate) fn state_at(&self, index: usize) -> &State {
        &self.states[index]
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("values", &self.values.iter().map(|v| &v.name).collect::<Vec<_>>())
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("start", &self.start_state().name)
            .field("eof_policy", &self.eof_policy)
            .finish()
    }
}
