//! Pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::source::DEFAULT_INDEX_FILE;
use crate::template::EofPolicy;

/// Plain configuration for a directory-backed pipeline.
///
/// Deserialises from any serde format, e.g. JSON:
///
/// ```json
/// { "template_dir": "/etc/ferrisfsm/templates", "eof_policy": "Discard" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the index and the template files.
    pub template_dir: PathBuf,

    /// Index file name inside `template_dir` (default: `index`).
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Force an end-of-input policy on every loaded template.
    #[serde(default)]
    pub eof_policy: Option<EofPolicy>,
}

impl PipelineConfig {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            index_file: default_index_file(),
            eof_policy: None,
        }
    }
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"template_dir": "/tmp/templates"}"#).unwrap();
        assert_eq!(config, PipelineConfig::new("/tmp/templates"));
        assert_eq!(config.index_file, "index");
        assert_eq!(config.eof_policy, None);
    }

    #[test]
    fn test_full_json() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"template_dir": "t", "index_file": "idx", "eof_policy": "Discard"}"#,
        )
        .unwrap();
        assert_eq!(config.index_file, "idx");
        assert_eq!(config.eof_policy, Some(EofPolicy::Discard));
    }
}
