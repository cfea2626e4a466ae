//! Configuration module

mod options;

pub use options::MarkdownOptions;
pub use options::PipelineOptions;
