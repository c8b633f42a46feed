//! Caller-supplied attributes used to pick a template.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute name → value pairs, e.g. `Vendor=cisco_ios`, `Command=show vlan`.
///
/// # Example
///
/// ```rust
/// use ferrisfsm::Attributes;
///
/// let attrs = Attributes::new()
///     .with("Vendor", "cisco_ios")
///     .with("Command", "show vlan");
/// assert_eq!(attrs.get("Command"), Some("show vlan"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(IndexMap<String, String>);

impl Attributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Get an attribute value by exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value:?}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let attrs = Attributes::new()
            .with("Vendor", "cisco")
            .with("Command", "show vlan");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("Vendor"), Some("cisco"));
        assert_eq!(attrs.get("vendor"), None);
    }

    #[test]
    fn test_from_iter_and_display() {
        let attrs: Attributes = [("Vendor", "cisco"), ("Command", "show vlan")]
            .into_iter()
            .collect();
        assert_eq!(attrs.to_string(), r#"{Vendor: "cisco", Command: "show vlan"}"#);
    }

    #[test]
    fn test_deserialise_from_json() {
        let attrs: Attributes =
            serde_json::from_str(r#"{"Vendor": "arista_eos", "Command": "show version"}"#).unwrap();
        assert_eq!(attrs.get("Vendor"), Some("arista_eos"));
        assert_eq!(attrs.iter().next().map(|(k, _)| k.as_str()), Some("Vendor"));
    }
}
