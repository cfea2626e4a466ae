//! Page expansion
//!
//! Regular files pass through as a single page. Generator files fan out into
//! one page per item of their collection.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::content::{FileKind, FrontMatterExtractor, GeneratorSpec, SourceFile};
use crate::data::{GlobalData, Mapping, Value};
use crate::error::{NucleusError, Result};
use crate::render::Renderer;

/// A source file after front-matter extraction and classification
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub base: PathBuf,
    pub path: PathBuf,
    /// Template name, the base-relative source path
    pub template: String,
    /// Content with the front-matter block removed
    pub body: Arc<str>,
    pub front_matter: Mapping,
    pub kind: FileKind,
}

impl ParsedFile {
    /// Extract front-matter and decide the file kind
    pub fn parse(
        file: SourceFile,
        extractor: &dyn FrontMatterExtractor,
        marker: char,
    ) -> Result<Self> {
        let (front_matter, body) =
            extractor
                .extract(&file.contents)
                .map_err(|e| NucleusError::FrontMatterParse {
                    file: file.path.clone(),
                    message: format!("{e:#}"),
                })?;
        let kind = FileKind::classify(&file, &front_matter, marker)?;

        Ok(Self {
            template: file.relative_name(),
            body: Arc::from(body),
            front_matter,
            kind,
            base: file.base,
            path: file.path,
        })
    }
}

/// An output page, ready to be recorded and rendered
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFile {
    /// Originating source file
    pub source: PathBuf,
    pub template: String,
    pub body: Arc<str>,
    /// Output path
    pub path: PathBuf,
    /// Output path relative to the file base, `/` separated
    pub relative: String,
    /// Metadata recorded in the page registry
    pub front_matter: Mapping,
    pub context: Mapping,
}

/// Expands parsed files into output pages
pub struct PageExpander<'a> {
    global: &'a GlobalData,
    renderer: &'a dyn Renderer,
}

impl<'a> PageExpander<'a> {
    pub fn new(global: &'a GlobalData, renderer: &'a dyn Renderer) -> Self {
        Self { global, renderer }
    }

    /// Expand a file given its base context
    ///
    /// On error the file yields no pages at all.
    pub fn expand(&self, file: &ParsedFile, base_context: Mapping) -> Result<Vec<DerivedFile>> {
        match &file.kind {
            FileKind::Regular => Ok(vec![DerivedFile {
                source: file.path.clone(),
                template: file.template.clone(),
                body: Arc::clone(&file.body),
                path: file.path.clone(),
                relative: file.template.clone(),
                front_matter: file.front_matter.clone(),
                context: base_context,
            }]),
            FileKind::Generator(spec) => self.generate(file, spec, &base_context),
        }
    }

    fn generate(
        &self,
        file: &ParsedFile,
        spec: &GeneratorSpec,
        base_context: &Mapping,
    ) -> Result<Vec<DerivedFile>> {
        let items = match self.global.get(&spec.collection) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(NucleusError::CollectionNotSequence {
                    file: file.path.clone(),
                    collection: spec.collection.clone(),
                })
            }
            None => {
                return Err(NucleusError::CollectionNotFound {
                    file: file.path.clone(),
                    collection: spec.collection.clone(),
                })
            }
        };

        let mut pages = Vec::with_capacity(items.len());
        for item in items {
            let mut context = base_context.clone();
            let mut front_matter = file.front_matter.clone();
            context.insert(spec.variable.clone(), item.clone());

            for (key, value) in &spec.front_matter {
                let value = match value {
                    Value::String(template) => Value::String(self.evaluate(
                        file,
                        &format!("generate.frontMatter.{key}"),
                        template,
                        &context,
                    )?),
                    other => other.clone(),
                };
                front_matter.insert(key.clone(), value.clone());
                context.insert(key.clone(), value);
            }

            let filename = self.evaluate(file, "generate.filename", &spec.filename, &context)?;
            let relative =
                base_relative(&filename).ok_or_else(|| NucleusError::InvalidGenerator {
                    file: file.path.clone(),
                    message: format!(
                        "`{}` rendered `{}`, which is not a path below the base directory",
                        spec.filename,
                        filename.trim()
                    ),
                })?;

            tracing::debug!("Generated {} from {:?}", relative, file.path);
            pages.push(DerivedFile {
                source: file.path.clone(),
                template: file.template.clone(),
                body: Arc::clone(&file.body),
                path: file.base.join(&relative),
                relative,
                front_matter,
                context,
            });
        }

        Ok(pages)
    }

    fn evaluate(
        &self,
        file: &ParsedFile,
        field: &str,
        template: &str,
        context: &Mapping,
    ) -> Result<String> {
        self.renderer
            .render_string(template, context)
            .map_err(|e| NucleusError::Template {
                file: file.path.clone(),
                template: field.to_string(),
                message: format!("{e:#}"),
            })
    }
}

/// Normalize a rendered filename into a `/` separated path below the base.
///
/// A leading `/` is dropped. `None` for empty paths and paths with `..` or a
/// drive prefix.
fn base_relative(filename: &str) -> Option<String> {
    let trimmed = filename.trim().trim_start_matches('/');
    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
