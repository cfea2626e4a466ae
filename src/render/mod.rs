//! Template rendering
//!
//! The pipeline only depends on the [`Renderer`] trait. [`TeraRenderer`] is
//! the default implementation, with a `markdown` filter registered.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, ErrorKind, Template, Tera};
use walkdir::WalkDir;

use crate::config::PipelineOptions;
use crate::content::{to_slash, FrontMatterExtractor, MarkdownRenderer, YamlFrontMatter};
use crate::data::{Mapping, Value};

/// Trait for template renderers
pub trait Renderer: Send + Sync {
    /// Render a source file's body, registered under `name`, with the given context
    fn render(&self, name: &str, source: &str, context: &Mapping) -> Result<String>;

    /// Render a one-off template string with the given context
    fn render_string(&self, template: &str, context: &Mapping) -> Result<String>;
}

/// Tera based renderer
#[derive(Clone)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Create a renderer from pipeline options
    ///
    /// Every template under `template_root_path` is loaded so that source
    /// files can extend or include them. Templates that do not parse are
    /// skipped with a warning.
    pub fn new(options: &PipelineOptions) -> Result<Self> {
        let mut tera = match &options.template_root_path {
            Some(root) => load_root(root)?,
            None => Tera::default(),
        };

        if options.autoescape {
            tera.autoescape_on(vec![".html", ".htm", ".xml"]);
        } else {
            tera.autoescape_on(vec![]);
        }

        let markdown = MarkdownRenderer::with_options(options.markdown.clone());
        tera.register_filter("markdown", MarkdownFilter(Arc::new(markdown)));

        Ok(Self { tera })
    }

    /// Access the Tera environment, e.g. to register filters and functions
    pub fn tera_mut(&mut self) -> &mut Tera {
        &mut self.tera
    }
}

fn load_root(root: &Path) -> Result<Tera> {
    if !root.is_dir() {
        return Err(anyhow!("Template root not found: {:?}", root));
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Ok(contents) = fs::read_to_string(path) else {
            tracing::debug!("Skipping non-text file {:?}", path);
            continue;
        };
        let name = to_slash(path.strip_prefix(root).unwrap_or(path));

        // The root may hold source pages, whose front-matter precedes `extends`
        let body = match YamlFrontMatter.extract(&contents) {
            Ok((_, body)) => body.to_string(),
            Err(_) => contents.clone(),
        };

        match Template::new(&name, None, &body) {
            Ok(_) => templates.push((name, body)),
            Err(e) => tracing::warn!("Skipping template {:?}: {}", path, e),
        }
    }

    // Drop children whose parent did not load, until the rest links up
    loop {
        let mut tera = Tera::default();
        let err = match tera.add_raw_templates(templates.clone()) {
            Ok(()) => {
                tracing::debug!("Loaded {} templates from {:?}", templates.len(), root);
                return Ok(tera);
            }
            Err(err) => err,
        };

        let broken = match &err.kind {
            ErrorKind::MissingParent { current, .. } => Some(current.clone()),
            ErrorKind::CircularExtend { tpl, .. } => Some(tpl.clone()),
            _ => None,
        };
        let Some(broken) = broken else {
            return Err(err.into());
        };
        tracing::warn!("Skipping template {:?}: {}", broken, err);
        templates.retain(|(name, _)| *name != broken);
    }
}

fn to_context(context: &Mapping) -> Result<Context> {
    Ok(Context::from_value(Value::Object(context.clone()))?)
}

impl Renderer for TeraRenderer {
    fn render(&self, name: &str, source: &str, context: &Mapping) -> Result<String> {
        let mut tera = self.tera.clone();
        tera.add_raw_template(name, source)?;
        Ok(tera.render(name, &to_context(context)?)?)
    }

    fn render_string(&self, template: &str, context: &Mapping) -> Result<String> {
        let mut tera = self.tera.clone();
        Ok(tera.render_str(template, &to_context(context)?)?)
    }
}

/// Tera filter: render markdown to HTML
struct MarkdownFilter(Arc<MarkdownRenderer>);

impl tera::Filter for MarkdownFilter {
    fn filter(
        &self,
        value: &tera::Value,
        _args: &HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let s = tera::try_get_value!("markdown", "value", String, value);
        self.0
            .render(&s)
            .map(tera::Value::String)
            .map_err(|e| tera::Error::msg(e.to_string()))
    }

    fn is_safe(&self) -> bool {
        true
    }
}
