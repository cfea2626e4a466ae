//! Content module - source files, front-matter and markdown

mod file;
mod frontmatter;
mod markdown;

pub use file::{to_slash, FileKind, GeneratorSpec, SourceFile, GENERATE_KEY};
pub use frontmatter::{FrontMatterExtractor, YamlFrontMatter};
pub use markdown::MarkdownRenderer;
