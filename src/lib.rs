//! nucleus-rs: template pages with front-matter, global data and generated pages
//!
//! Source files flow through a [`pipeline::Pipeline`]: their front-matter is
//! merged over the global data sets, generator files (`$name.html`) fan out
//! into one page per collection item, and every page can see the full page
//! list under `all_pages` before it is rendered with Tera.

pub mod commands;
pub mod config;
pub mod content;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod render;

pub use error::NucleusError;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Options file looked up in the base directory
pub const OPTIONS_FILE: &str = "nucleus.yml";

/// Default glob for source files, relative to the source directory
pub const DEFAULT_PATTERN: &str = "**/*.html";

/// Default source directory, relative to the base directory
pub const DEFAULT_SOURCE_DIR: &str = "html";

/// Default output directory, relative to the base directory
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// A site build: where sources come from and where pages go
#[derive(Debug, Clone)]
pub struct Nucleus {
    /// Pipeline options
    pub options: config::PipelineOptions,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source (template) directory
    pub source_dir: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
    /// Glob selecting source files
    pub pattern: String,
}

impl Nucleus {
    /// Create a new instance, loading `nucleus.yml` from `base_dir` if present
    pub fn new<P: AsRef<Path>>(base_dir: P, source_dir: &str, output_dir: &str) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let options_path = base_dir.join(OPTIONS_FILE);

        let options = if options_path.exists() {
            config::PipelineOptions::load(&options_path)?
        } else {
            config::PipelineOptions::default()
        };

        Ok(Self::with_options(base_dir, source_dir, output_dir, options))
    }

    /// Create a new instance with explicit options
    pub fn with_options<P: AsRef<Path>>(
        base_dir: P,
        source_dir: &str,
        output_dir: &str,
        mut options: config::PipelineOptions,
    ) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        options.resolve_paths(&base_dir);

        Self {
            options,
            source_dir: base_dir.join(source_dir),
            output_dir: base_dir.join(output_dir),
            pattern: DEFAULT_PATTERN.to_string(),
            base_dir,
        }
    }

    /// Construct the pipeline, loading global data
    pub fn pipeline(&self) -> Result<pipeline::Pipeline> {
        Ok(pipeline::Pipeline::new(self.options.clone())?)
    }

    /// Render every source file into the output directory
    pub fn build(&self) -> Result<pipeline::RunReport> {
        commands::build::run(self)
    }

    /// Clean the output directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
