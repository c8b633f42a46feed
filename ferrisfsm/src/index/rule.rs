//! Index rules and their attribute constraints.

use regex::Regex;

use super::Attributes;

/// A single attribute constraint: the named attribute must contain a match
/// for the pattern.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Attribute name, compared exactly.
    pub attribute: String,

    /// Compiled pattern, searched (not anchored) in the attribute value.
    pub pattern: Regex,
}

impl Constraint {
    /// Compile a constraint, expanding `[[...]]` completion shorthand.
    pub fn new(attribute: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            attribute: attribute.into(),
            pattern: Regex::new(&expand_completion(pattern))?,
        })
    }

    /// Check the constraint against a set of attributes.
    ///
    /// An attribute the caller did not supply never matches.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        attributes
            .get(&self.attribute)
            .is_some_and(|value| self.pattern.is_match(value))
    }
}

/// One line of the index: constraints mapped to a template id.
#[derive(Debug, Clone)]
pub struct IndexRule {
    /// Template identifier (usually a file name).
    pub template: String,

    /// Non-wildcard constraints, in column order.
    pub constraints: Vec<Constraint>,

    /// Line in the index file the rule came from.
    pub line: usize,
}

impl IndexRule {
    /// Check if every constraint holds for the attributes.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        self.constraints.iter().all(|c| c.matches(attributes))
    }

    /// Number of non-wildcard constraints.
    pub fn specificity(&self) -> usize {
        self.constraints.len()
    }

    /// Get a constraint by attribute name.
    pub fn constraint(&self, attribute: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.attribute == attribute)
    }
}

/// Expand CLI completion shorthand: `sh[[ow]]` becomes `sh(o(w)?)?`, so an
/// abbreviated command still matches.
pub fn expand_completion(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    while let Some(open) = rest.find("[[") {
        let Some(close) = rest[open + 2..].find("]]").map(|off| open + 2 + off) else {
            break;
        };
        let word = &rest[open + 2..close];
        if word.is_empty() {
            out.push_str(&rest[..close + 2]);
            rest = &rest[close + 2..];
            continue;
        }

        out.push_str(&rest[..open]);
        for c in word.chars() {
            out.push('(');
            out.push(c);
        }
        out.push_str(&")?".repeat(word.chars().count()));
        rest = &rest[close + 2..];
    }

    out.push_str(rest);
    out
}
