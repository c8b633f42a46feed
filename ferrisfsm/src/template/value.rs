//! Value descriptors declared by `Value` lines.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// A single option flag on a `Value` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOption {
    /// Rows with this value empty are dropped.
    Required,
    /// The value survives a Record and carries into following rows.
    Filldown,
    /// A captured value is copied upward into earlier rows with an empty cell.
    Fillup,
    /// Captures accumulate into a list instead of overwriting.
    List,
    /// The value is part of the row identity.
    Key,
}

impl FromStr for ValueOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Required" => Ok(ValueOption::Required),
            "Filldown" => Ok(ValueOption::Filldown),
            "Fillup" => Ok(ValueOption::Fillup),
            "List" => Ok(ValueOption::List),
            "Key" => Ok(ValueOption::Key),
            other => Err(format!("unknown value option '{other}'")),
        }
    }
}

impl fmt::Display for ValueOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueOption::Required => "Required",
            ValueOption::Filldown => "Filldown",
            ValueOption::Fillup => "Fillup",
            ValueOption::List => "List",
            ValueOption::Key => "Key",
        };
        f.write_str(name)
    }
}

/// The set of options attached to a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueOptions {
    pub required: bool,
    pub filldown: bool,
    pub fillup: bool,
    pub list: bool,
    pub key: bool,
}

impl ValueOptions {
    /// Parse a comma-separated option list such as `Required,Filldown`.
    pub fn parse(list: &str) -> Result<Self, String> {
        let mut options = Self::default();
        for raw in list.split(',') {
            let option: ValueOption = raw.trim().parse()?;
            let slot = match option {
                ValueOption::Required => &mut options.required,
                ValueOption::Filldown => &mut options.filldown,
                ValueOption::Fillup => &mut options.fillup,
                ValueOption::List => &mut options.list,
                ValueOption::Key => &mut options.key,
            };
            if *slot {
                return Err(format!("duplicate value option '{option}'"));
            }
            *slot = true;
        }
        if options.filldown && options.fillup {
            return Err("Filldown and Fillup are mutually exclusive".to_string());
        }
        Ok(options)
    }

    /// Check whether a given option is set.
    pub fn contains(&self, option: ValueOption) -> bool {
        match option {
            ValueOption::Required => self.required,
            ValueOption::Filldown => self.filldown,
            ValueOption::Fillup => self.fillup,
            ValueOption::List => self.list,
            ValueOption::Key => self.key,
        }
    }
}

/// A named field a template can capture.
///
/// The pattern is kept exactly as written (outer parentheses included); rules
/// embed it as a named capture group via [`ValueDef::capture_group`].
#[derive(Debug, Clone)]
pub struct ValueDef {
    /// Field name, used as the table header and capture group name.
    pub name: String,

    /// The value's pattern as declared, e.g. `(\d+)`.
    pub pattern: String,

    /// Option flags.
    pub options: ValueOptions,
}

impl ValueDef {
    /// Create a value definition, validating the name and pattern.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let pattern = pattern.into();

        if !is_valid_name(&name) {
            return Err(format!("invalid value name '{name}'"));
        }
        if !(pattern.starts_with('(') && pattern.ends_with(')')) || pattern.len() < 2 {
            return Err(format!(
                "pattern for value '{name}' must be enclosed in parentheses"
            ));
        }

        Ok(Self {
            name,
            pattern,
            options: ValueOptions::default(),
        })
    }

    /// Set the option flags.
    pub fn with_options(mut self, options: ValueOptions) -> Self {
        self.options = options;
        self
    }

    /// The pattern rewritten as a named group: `(\d+)` becomes `(?P<NAME>\d+)`.
    pub fn capture_group(&self) -> String {
        format!("(?P<{}>{}", self.name, &self.pattern[1..])
    }

    /// Compile the value's group on its own to check its syntax.
    pub fn validate(&self) -> Result<(), regex::Error> {
        Regex::new(&self.capture_group()).map(|_| ())
    }

    pub fn is_required(&self) -> bool {
        self.options.required
    }

    pub fn is_filldown(&self) -> bool {
        self.options.filldown
    }

    pub fn is_fillup(&self) -> bool {
        self.options.fillup
    }

    pub fn is_list(&self) -> bool {
        self.options.list
    }

    pub fn is_key(&self) -> bool {
        self.options.key
    }
}

/// Names must be usable as regex group names.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let options = ValueOptions::parse("Required,Filldown").unwrap();
        assert!(options.required);
        assert!(options.filldown);
        assert!(!options.list);
        assert!(options.contains(ValueOption::Required));
        assert!(!options.contains(ValueOption::Key));
    }

    #[test]
    fn test_parse_options_rejects_unknown_and_duplicates() {
        assert!(ValueOptions::parse("Sticky").is_err());
        assert!(ValueOptions::parse("List,List").is_err());
        assert!(ValueOptions::parse("Filldown,Fillup").is_err());
    }

    #[test]
    fn test_capture_group() {
        let value = ValueDef::new("VLAN_ID", r"(\d+)").unwrap();
        assert_eq!(value.capture_group(), r"(?P<VLAN_ID>\d+)");
        assert!(value.validate().is_ok());
    }

    #[test]
    fn test_pattern_must_be_parenthesised() {
        assert!(ValueDef::new("NAME", r"\S+").is_err());
        assert!(ValueDef::new("NAME", r"(\S+").is_err());
    }

    #[test]
    fn test_invalid_pattern_fails_validation() {
        let value = ValueDef::new("NAME", r"([a-)").unwrap();
        assert!(value.validate().is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(is_valid_name("INTERFACE"));
        assert!(is_valid_name("_hidden2"));
        assert!(!is_valid_name("2FAST"));
        assert!(!is_valid_name("SPLIT-NAME"));
        assert!(!is_valid_name(""));
    }
}
