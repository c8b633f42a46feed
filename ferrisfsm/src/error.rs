//! Error types for ferrisfsm.

use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

/// Main error type for ferrisfsm operations.
///
/// Every variant belongs to exactly one pipeline [`Stage`], see [`Error::stage`].
#[derive(Error, Debug)]
pub enum Error {
    /// No index rule matched the supplied attributes.
    #[error("No template found for attributes {attributes}")]
    TemplateNotFound { attributes: String },

    /// The index itself could not be read or is malformed.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// The resolved template could not be loaded.
    #[error("Template load error: {0}")]
    TemplateLoad(#[from] TemplateError),

    /// The engine could not complete the parse.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// The pipeline stage this error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            Error::TemplateNotFound { .. } | Error::Index(_) => Stage::Resolve,
            Error::TemplateLoad(_) => Stage::Load,
            Error::Parse(_) => Stage::Parse,
        }
    }

    /// Convert into the serialisable `{stage, message}` form.
    pub fn to_failure(&self) -> Failure {
        Failure {
            stage: self.stage(),
            message: self.to_string(),
        }
    }
}

/// Pipeline stage a failure is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    /// Index lookup (`TemplateNotFound`).
    Resolve,
    /// Template loading and validation (`TemplateLoadError`).
    Load,
    /// Running the state machine (`ParseError`).
    Parse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "TemplateNotFound",
            Stage::Load => "TemplateLoadError",
            Stage::Parse => "ParseError",
        };
        f.write_str(name)
    }
}

/// Structured failure handed back to callers that want data rather than an error value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Stage the pipeline stopped at.
    pub stage: Stage,

    /// Human-readable description.
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        err.to_failure()
    }
}

/// Index loading errors.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The index could not be read from storage.
    #[error("Failed to read index '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A row did not name a template.
    #[error("Line {line}: missing template")]
    MissingTemplate { line: usize },

    /// A row has no attribute constraints.
    #[error("Line {line}: rule for '{template}' has no attribute constraints")]
    NoConstraints { line: usize, template: String },

    /// A field could not be interpreted.
    #[error("Line {line}: malformed field '{field}'")]
    MalformedField { line: usize, field: String },

    /// A constraint pattern failed to compile.
    #[error("Line {line}: invalid pattern for '{attribute}': {source}")]
    InvalidPattern {
        line: usize,
        attribute: String,
        #[source]
        source: regex::Error,
    },
}

/// Template loading and validation errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template could not be read from storage.
    #[error("Failed to read template '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A line of the template does not fit the grammar.
    #[error("Line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Two values share a name.
    #[error("Line {line}: duplicate value '{name}'")]
    DuplicateValue { line: usize, name: String },

    /// Two states share a name.
    #[error("Line {line}: duplicate state '{name}'")]
    DuplicateState { line: usize, name: String },

    /// A rule transitions to a state that is never declared.
    #[error("Line {line}: unknown state '{name}'")]
    UnknownState { line: usize, name: String },

    /// A rule references a value that is never declared.
    #[error("Line {line}: unknown value '{name}'")]
    UnknownValue { line: usize, name: String },

    /// A value or rule pattern failed to compile.
    #[error("Line {line}: invalid pattern: {source}")]
    InvalidPattern {
        line: usize,
        #[source]
        source: regex::Error,
    },

    /// The template declares no states.
    #[error("Template declares no states")]
    NoStates,
}

/// Errors raised while running a loaded template.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A rule with an `Error` action matched.
    #[error("State '{state}', line {line_number}: {message} (input: '{line}')")]
    RuleError {
        state: String,
        line_number: usize,
        line: String,
        message: String,
    },
}

/// Result type alias using ferrisfsm's Error.
pub type Result<T> = std::result::Result<T, Error>;
