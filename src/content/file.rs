//! Source files and their classification

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{Mapping, Value};
use crate::error::{NucleusError, Result};

/// Front-matter key carrying the generator block
pub const GENERATE_KEY: &str = "generate";

/// A file flowing through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Directory output paths are computed relative to
    pub base: PathBuf,
    /// Full path of the file
    pub path: PathBuf,
    /// Raw file content
    pub contents: String,
}

impl SourceFile {
    pub fn new<B: Into<PathBuf>, P: Into<PathBuf>>(base: B, path: P, contents: String) -> Self {
        let base = base.into();
        let path = path.into();
        let path = if path.is_relative() {
            base.join(path)
        } else {
            path
        };
        Self {
            base,
            path,
            contents,
        }
    }

    /// Path relative to the base, falling back to the full path
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }

    /// Relative path with `/` separators, used as template name and page path
    pub fn relative_name(&self) -> String {
        to_slash(self.relative())
    }

    /// File name without directories
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// Join path components with forward slashes
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// The `generate` block of a generator file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    /// Name of a sequence in the global data
    pub collection: String,
    /// Binding name for the current item
    pub variable: String,
    /// Template for the derived output path, relative to the file base
    pub filename: String,
    /// Extra bindings, each value evaluated as a template in key order
    #[serde(default, rename = "frontMatter", alias = "front_matter")]
    pub front_matter: IndexMap<String, Value>,
}

/// How a file is handled by the expander
#[derive(Debug, Clone, PartialEq)]
pub enum FileKind {
    Regular,
    Generator(GeneratorSpec),
}

impl FileKind {
    /// Classify a file once from its name and front-matter
    ///
    /// Only files whose name starts with `marker` are generators. Such a file
    /// must carry a well-formed `generate` block.
    pub fn classify(file: &SourceFile, front_matter: &Mapping, marker: char) -> Result<Self> {
        if !file.file_name().starts_with(marker) {
            return Ok(FileKind::Regular);
        }

        let Some(block) = front_matter.get(GENERATE_KEY) else {
            return Err(NucleusError::InvalidGenerator {
                file: file.path.clone(),
                message: format!("generator files must define a `{GENERATE_KEY}` block"),
            });
        };

        let spec = serde_json::from_value::<GeneratorSpec>(block.clone()).map_err(|e| {
            NucleusError::InvalidGenerator {
                file: file.path.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(FileKind::Generator(spec))
    }
}
