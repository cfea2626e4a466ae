//! Pipeline options (nucleus.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{NucleusError, Result};

/// Options supplied once per pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Base directory for resolving template includes/extends
    #[serde(alias = "templateRootPath")]
    pub template_root_path: Option<PathBuf>,

    /// Directory holding global data files
    #[serde(alias = "dataPath")]
    pub data_path: Option<PathBuf>,

    /// Extension of global data files, without the dot
    #[serde(alias = "dataExtension")]
    pub data_extension: String,

    /// Leading character that marks a generator file
    #[serde(alias = "generatorMarker")]
    pub generator_marker: char,

    /// Escape HTML in rendered expressions
    pub autoescape: bool,

    /// Treat template errors as fatal
    pub strict: bool,

    #[serde(alias = "markedOptions")]
    pub markdown: MarkdownOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            template_root_path: None,
            data_path: None,
            data_extension: "yaml".to_string(),
            generator_marker: '$',
            autoescape: false,
            strict: false,
            markdown: MarkdownOptions::default(),
        }
    }
}

impl PipelineOptions {
    /// Load options from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| NucleusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options: PipelineOptions = serde_yaml::from_str(&content)
            .map_err(|e| NucleusError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded options from {:?}", path);
        Ok(options)
    }

    /// Resolve relative directories against a base directory
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if let Some(root) = self.template_root_path.as_mut() {
            if root.is_relative() {
                *root = base_dir.join(&*root);
            }
        }
        if let Some(data) = self.data_path.as_mut() {
            if data.is_relative() {
                *data = base_dir.join(&*data);
            }
        }
    }
}

/// Markdown filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// GitHub flavoured extensions (tables, strikethrough, task lists)
    pub gfm: bool,
    pub smartypants: bool,
    /// Highlight fenced code blocks
    pub highlight: bool,
    pub highlight_theme: String,
    pub line_numbers: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            smartypants: false,
            highlight: false,
            highlight_theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
        }
    }
}
