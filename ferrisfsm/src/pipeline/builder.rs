//! Builder for creating pipelines.

use std::path::PathBuf;
use std::sync::Arc;

use log::warn;

use super::Pipeline;
use super::config::PipelineConfig;
use super::source::{DEFAULT_INDEX_FILE, DirectorySource, TemplateSource};
use crate::template::EofPolicy;

enum SourceKind {
    Directory(PathBuf),
    Custom(Arc<dyn TemplateSource>),
}

/// Builder for constructing a [`Pipeline`].
///
/// # Example
///
/// ```rust,no_run
/// use ferrisfsm::{Attributes, EofPolicy, PipelineBuilder};
///
/// # fn example() -> Result<(), ferrisfsm::Error> {
/// let pipeline = PipelineBuilder::from_dir("/etc/ferrisfsm/templates")
///     .index_file("index")
///     .eof_policy(EofPolicy::Discard)
///     .build();
///
/// let attrs = Attributes::new()
///     .with("Vendor", "cisco_ios")
///     .with("Command", "show vlan");
/// let records = pipeline.run(&attrs, "10   data   active\n")?;
/// # Ok(())
/// # }
/// ```
pub struct PipelineBuilder {
    source: SourceKind,
    index_file: Option<String>,
    eof_policy: Option<EofPolicy>,
}

impl PipelineBuilder {
    /// Start from a template directory.
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            source: SourceKind::Directory(root.into()),
            index_file: None,
            eof_policy: None,
        }
    }

    /// Start from any template source.
    pub fn from_source(source: impl TemplateSource + 'static) -> Self {
        Self {
            source: SourceKind::Custom(Arc::new(source)),
            index_file: None,
            eof_policy: None,
        }
    }

    /// Start from a plain configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            source: SourceKind::Directory(config.template_dir.clone()),
            index_file: Some(config.index_file.clone()),
            eof_policy: config.eof_policy,
        }
    }

    /// Set the index file name (default: `index`).
    ///
    /// Only applies to directory sources. A source passed to
    /// [`from_source`](Self::from_source) decides where its index lives, so
    /// the name is ignored there and [`build`](Self::build) logs a warning.
    pub fn index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = Some(name.into());
        self
    }

    /// Force an end-of-input policy on every loaded template, overriding what
    /// the template declares.
    pub fn eof_policy(mut self, policy: EofPolicy) -> Self {
        self.eof_policy = Some(policy);
        self
    }

    /// Build the pipeline.
    ///
    /// Nothing is read yet; the index and templates are loaded per run.
    pub fn build(self) -> Pipeline {
        let source: Arc<dyn TemplateSource> = match self.source {
            SourceKind::Directory(root) => {
                let index_file = self
                    .index_file
                    .unwrap_or_else(|| DEFAULT_INDEX_FILE.to_string());
                Arc::new(DirectorySource::new(root).with_index_file(index_file))
            }
            SourceKind::Custom(source) => {
                if let Some(name) = &self.index_file {
                    warn!(
                        "Index file '{}' ignored: the template source locates its own index",
                        name
                    );
                }
                source
            }
        };
        Pipeline::new(source, self.eof_policy)
    }
}
