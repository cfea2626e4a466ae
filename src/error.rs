//! Error types for the pipeline
//!
//! Errors fall in two classes. Fatal errors abort the whole run. Per-file
//! errors only drop the offending file's output and are reported back to the
//! caller in the run report.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum NucleusError {
    #[error("Failed to load data file {path:?}: {message}")]
    DataLoad { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to set up renderer: {0}")]
    Renderer(String),

    #[error("Collection `{collection}` not found (referenced by {file:?})")]
    CollectionNotFound { file: PathBuf, collection: String },

    #[error("Collection `{collection}` is not a sequence (referenced by {file:?})")]
    CollectionNotSequence { file: PathBuf, collection: String },

    #[error("Invalid generator in {file:?}: {message}")]
    InvalidGenerator { file: PathBuf, message: String },

    #[error("Failed to parse front-matter in {file:?}: {message}")]
    FrontMatterParse { file: PathBuf, message: String },

    #[error("Template error in {file:?} (template `{template}`): {message}")]
    Template {
        file: PathBuf,
        template: String,
        message: String,
    },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NucleusError {
    /// Whether this error aborts the run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NucleusError::DataLoad { .. }
                | NucleusError::Config(_)
                | NucleusError::Renderer(_)
                | NucleusError::Io { .. }
        )
    }

    /// The source file a per-file error belongs to
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            NucleusError::CollectionNotFound { file, .. }
            | NucleusError::CollectionNotSequence { file, .. }
            | NucleusError::InvalidGenerator { file, .. }
            | NucleusError::FrontMatterParse { file, .. }
            | NucleusError::Template { file, .. } => Some(file),
            NucleusError::DataLoad { path, .. } | NucleusError::Io { path, .. } => Some(path),
            NucleusError::Config(_) | NucleusError::Renderer(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NucleusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let err = NucleusError::DataLoad {
            path: PathBuf::from("data/team.yaml"),
            message: "bad indent".to_string(),
        };
        assert!(err.is_fatal());

        let err = NucleusError::CollectionNotFound {
            file: PathBuf::from("html/$ghost.html"),
            collection: "ghosts".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.file(), Some(&PathBuf::from("html/$ghost.html")));
    }

    #[test]
    fn test_error_display_names_file() {
        let err = NucleusError::Template {
            file: PathBuf::from("html/index.html"),
            template: "index.html".to_string(),
            message: "Variable `x` not found".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("index.html"));
        assert!(display.contains("Variable `x` not found"));
    }
}
