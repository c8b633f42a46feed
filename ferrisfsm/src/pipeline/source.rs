//! Storage for the index and templates.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::trace;

/// Default name of the index file in a template directory.
pub const DEFAULT_INDEX_FILE: &str = "index";

/// Read-only storage the pipeline loads the index and templates from.
///
/// Implementations are shared between threads, so they must not hand out
/// different content for the same name within one invocation.
pub trait TemplateSource: Send + Sync + fmt::Debug {
    /// Read the whole index text.
    fn read_index(&self) -> io::Result<String>;

    /// Read the text of the template with the given identifier.
    fn read_template(&self, id: &str) -> io::Result<String>;

    /// Name used for the index in error messages.
    fn index_name(&self) -> String {
        DEFAULT_INDEX_FILE.to_string()
    }
}

/// An index file plus template files, all in one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    index_file: String,
}

impl DirectorySource {
    /// Use `root` with the default index file name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }

    /// Use a different index file name.
    pub fn with_index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    /// The template directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let plain = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{name}' is not a plain file name inside the template directory"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl TemplateSource for DirectorySource {
    fn read_index(&self) -> io::Result<String> {
        let path = self.path_for(&self.index_file)?;
        trace!("Reading index {}", path.display());
        std::fs::read_to_string(path)
    }

    fn read_template(&self, id: &str) -> io::Result<String> {
        let path = self.path_for(id)?;
        trace!("Reading template {}", path.display());
        std::fs::read_to_string(path)
    }

    fn index_name(&self) -> String {
        self.root.join(&self.index_file).display().to_string()
    }
}

/// Index and templates held in memory.
///
/// # Example
///
/// ```rust
/// use ferrisfsm::{MemorySource, TemplateSource};
///
/// let source = MemorySource::new()
///     .with_index("Template=vlan.template, Command=show vlan")
///     .with_template("vlan.template", "Value ID (\\d+)\n\nStart\n  ^${ID} -> Record\n");
/// assert!(source.read_template("vlan.template").is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    index: Option<String>,
    templates: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index text.
    pub fn with_index(mut self, text: impl Into<String>) -> Self {
        self.index = Some(text.into());
        self
    }

    /// Add or replace a template.
    pub fn with_template(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(id.into(), text.into());
        self
    }
}

impl TemplateSource for MemorySource {
    fn read_index(&self) -> io::Result<String> {
        self.index
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no index loaded"))
    }

    fn read_template(&self, id: &str) -> io::Result<String> {
        self.templates.get(id).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no template named '{id}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index"), "Template=a.textfsm, Command=x\n").unwrap();
        std::fs::write(dir.path().join("a.textfsm"), "Start\n").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.read_index().unwrap(), "Template=a.textfsm, Command=x\n");
        assert_eq!(source.read_template("a.textfsm").unwrap(), "Start\n");

        let err = source.read_template("missing.textfsm").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_directory_source_custom_index_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("templates.idx"), "Template=a, Vendor=v\n").unwrap();

        let source = DirectorySource::new(dir.path()).with_index_file("templates.idx");
        assert!(source.read_index().is_ok());
        assert!(source.index_name().ends_with("templates.idx"));
        assert!(DirectorySource::new(dir.path()).read_index().is_err());
    }

    #[test]
    fn test_directory_source_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        for name in ["../etc/passwd", "/etc/passwd", "", "a/../../b"] {
            let err = source.read_template(name).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{name}");
        }
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with_template("t", "Start\n");
        assert_eq!(source.read_template("t").unwrap(), "Start\n");
        assert_eq!(
            source.read_template("u").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(source.read_index().unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(source.index_name(), "index");
    }
}
