//! Pipeline module - turns source files into rendered pages
//!
//! Stages run in order: front-matter extraction, context building, page
//! expansion, page registry, rendering. The registry is a barrier: every
//! file is expanded and recorded before the first page renders, so each
//! context can list all pages of the run under `all_pages`.

mod context;
mod expand;
mod registry;

pub use context::build_context;
pub use expand::{DerivedFile, PageExpander, ParsedFile};
pub use registry::{PageEntry, PageRegistry, PageSnapshot, ALL_PAGES_KEY};

use std::path::PathBuf;
use tera::Tera;

use crate::config::PipelineOptions;
use crate::content::{FrontMatterExtractor, SourceFile, YamlFrontMatter};
use crate::data::{DataLoader, GlobalData};
use crate::error::{NucleusError, Result};
use crate::render::{Renderer, TeraRenderer};

type SetupHook = Box<dyn FnOnce(&mut Tera)>;

/// A rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Originating source file
    pub source: PathBuf,
    pub path: PathBuf,
    /// Output path relative to the file base, `/` separated
    pub relative: String,
    pub contents: String,
}

/// Pages expanded and recorded, waiting to be rendered
#[derive(Debug)]
pub struct PreparedRun {
    pub pages: Vec<DerivedFile>,
    pub snapshot: PageSnapshot,
    pub errors: Vec<NucleusError>,
}

/// Outcome of a run
#[derive(Debug)]
pub struct RunReport {
    pub rendered: Vec<RenderedFile>,
    pub pages: PageSnapshot,
    /// Per-file errors, in the order they occurred
    pub errors: Vec<NucleusError>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Builder for [`Pipeline`]
pub struct PipelineBuilder {
    options: PipelineOptions,
    global: Option<GlobalData>,
    renderer: Option<Box<dyn Renderer>>,
    extractor: Option<Box<dyn FrontMatterExtractor>>,
    setup: Vec<SetupHook>,
}

impl PipelineBuilder {
    /// Use the given global data instead of loading `data_path`
    pub fn global_data(mut self, global: GlobalData) -> Self {
        self.global = Some(global);
        self
    }

    /// Replace the default Tera renderer
    pub fn renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Replace the default YAML front-matter extractor
    pub fn front_matter<F: FrontMatterExtractor + 'static>(mut self, extractor: F) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Hook run once on the Tera environment after it is constructed
    pub fn setup_renderer<F: FnOnce(&mut Tera) + 'static>(mut self, hook: F) -> Self {
        self.setup.push(Box::new(hook));
        self
    }

    /// Load global data and construct the renderer
    pub fn build(self) -> Result<Pipeline> {
        let global = match self.global {
            Some(global) => global,
            None => DataLoader::new(&self.options.data_extension)
                .load(self.options.data_path.as_deref())?,
        };

        let renderer: Box<dyn Renderer> = match self.renderer {
            Some(renderer) => {
                if !self.setup.is_empty() {
                    tracing::warn!("Renderer overridden, setup hooks are not applied");
                }
                renderer
            }
            None => {
                let mut renderer = TeraRenderer::new(&self.options)
                    .map_err(|e| NucleusError::Renderer(format!("{e:#}")))?;
                for hook in self.setup {
                    hook(renderer.tera_mut());
                }
                Box::new(renderer)
            }
        };

        Ok(Pipeline {
            options: self.options,
            global,
            renderer,
            extractor: self
                .extractor
                .unwrap_or_else(|| Box::new(YamlFrontMatter)),
        })
    }
}

/// The page pipeline for one set of options
pub struct Pipeline {
    options: PipelineOptions,
    global: GlobalData,
    renderer: Box<dyn Renderer>,
    extractor: Box<dyn FrontMatterExtractor>,
}

impl Pipeline {
    pub fn builder(options: PipelineOptions) -> PipelineBuilder {
        PipelineBuilder {
            options,
            global: None,
            renderer: None,
            extractor: None,
            setup: Vec::new(),
        }
    }

    /// Build a pipeline with default collaborators
    pub fn new(options: PipelineOptions) -> Result<Self> {
        Self::builder(options).build()
    }

    pub fn global_data(&self) -> &GlobalData {
        &self.global
    }

    /// Run every stage over `files`
    pub fn run<I: IntoIterator<Item = SourceFile>>(&self, files: I) -> Result<RunReport> {
        let prepared = self.prepare(files)?;
        self.render(prepared)
    }

    /// Expand and record every file, then close the page registry
    pub fn prepare<I: IntoIterator<Item = SourceFile>>(&self, files: I) -> Result<PreparedRun> {
        let expander = PageExpander::new(&self.global, self.renderer.as_ref());
        let mut registry = PageRegistry::new();
        let mut pages = Vec::new();
        let mut errors = Vec::new();

        for file in files {
            let parsed =
                match ParsedFile::parse(file, self.extractor.as_ref(), self.options.generator_marker)
                {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        self.report(&mut errors, e)?;
                        continue;
                    }
                };

            let base_context = build_context(&self.global, Some(&parsed.front_matter));
            match expander.expand(&parsed, base_context) {
                Ok(derived) => {
                    for page in derived {
                        registry.record(page.relative.clone(), Some(&page.front_matter));
                        pages.push(page);
                    }
                }
                Err(e) => self.report(&mut errors, e)?,
            }
        }

        let snapshot = registry.barrier();
        tracing::info!("Prepared {} pages", snapshot.len());

        Ok(PreparedRun {
            pages,
            snapshot,
            errors,
        })
    }

    /// Render prepared pages with the page list injected
    pub fn render(&self, prepared: PreparedRun) -> Result<RunReport> {
        let PreparedRun {
            pages,
            snapshot,
            mut errors,
        } = prepared;
        let mut rendered = Vec::with_capacity(pages.len());

        for page in pages {
            let context = snapshot.annotate(page.context);
            match self.renderer.render(&page.template, &page.body, &context) {
                Ok(contents) => rendered.push(RenderedFile {
                    source: page.source,
                    path: page.path,
                    relative: page.relative,
                    contents,
                }),
                Err(e) => {
                    let err = NucleusError::Template {
                        file: page.source,
                        template: page.template,
                        message: format!("{e:#}"),
                    };
                    self.report(&mut errors, err)?;
                }
            }
        }

        tracing::info!(
            "Rendered {} pages ({} errors)",
            rendered.len(),
            errors.len()
        );

        Ok(RunReport {
            rendered,
            pages: snapshot,
            errors,
        })
    }

    /// Collect a per-file error, or fail the run when it must not be isolated
    fn report(&self, errors: &mut Vec<NucleusError>, err: NucleusError) -> Result<()> {
        let escalate =
            err.is_fatal() || (self.options.strict && matches!(err, NucleusError::Template { .. }));
        if escalate {
            return Err(err);
        }
        tracing::error!("{}", err);
        errors.push(err);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Mapping, Value};
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn global(value: Value) -> GlobalData {
        match value {
            Value::Object(map) => GlobalData::new(map),
            _ => unreachable!(),
        }
    }

    fn source(name: &str, contents: &str) -> SourceFile {
        SourceFile::new("/site/html", name, contents.to_string())
    }

    fn pipeline(data: Value) -> Pipeline {
        Pipeline::builder(PipelineOptions::default())
            .global_data(global(data))
            .build()
            .unwrap()
    }

    const MEMBER: &str = r#"---
generate:
  collection: team
  variable: person
  filename: "members/{{person.name}}.html"
---
<h1>{{ person.name }}</h1>"#;

    #[test]
    fn test_team_members_are_generated() {
        let pipeline = pipeline(json!({"team": [{"name": "Al"}, {"name": "Bo"}]}));
        let report = pipeline.run(vec![source("$member.html", MEMBER)]).unwrap();

        assert!(!report.has_errors());
        let outputs: Vec<_> = report
            .rendered
            .iter()
            .map(|r| (r.relative.as_str(), r.contents.as_str()))
            .collect();
        assert_eq!(
            outputs,
            vec![
                ("members/Al.html", "<h1>Al</h1>"),
                ("members/Bo.html", "<h1>Bo</h1>"),
            ]
        );
        assert_eq!(
            report.rendered[0].path,
            PathBuf::from("/site/html/members/Al.html")
        );
    }

    #[test]
    fn test_missing_collection_is_isolated() {
        let pipeline = pipeline(json!({}));
        let ghost = "---\ngenerate:\n  collection: ghosts\n  variable: g\n  filename: \"{{ g }}.html\"\n---\nboo";
        let report = pipeline
            .run(vec![
                source("$ghost.html", ghost),
                source("index.html", "home"),
            ])
            .unwrap();

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.rendered[0].relative, "index.html");
        assert_eq!(report.errors.len(), 1);
        match &report.errors[0] {
            NucleusError::CollectionNotFound { file, collection } => {
                assert_eq!(file, &PathBuf::from("/site/html/$ghost.html"));
                assert_eq!(collection, "ghosts");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(report.pages.len(), 1);
    }

    #[test]
    fn test_snapshot_lists_pages_in_discovery_order() {
        let pipeline = pipeline(json!({}));
        let prepared = pipeline
            .prepare(vec![
                source("A.html", "a"),
                source("B.html", "---\ntitle: B\n---\nb"),
            ])
            .unwrap();

        let mut b_meta = Mapping::new();
        b_meta.insert("title".to_string(), json!("B"));
        assert_eq!(
            prepared.snapshot.entries(),
            &[
                PageEntry {
                    path: "A.html".to_string(),
                    metadata: Mapping::new(),
                },
                PageEntry {
                    path: "B.html".to_string(),
                    metadata: b_meta,
                },
            ]
        );
    }

    #[test]
    fn test_snapshot_counts_every_output() {
        let pipeline = pipeline(json!({"team": [{"name": "Al"}, {"name": "Bo"}, {"name": "Cy"}]}));
        let report = pipeline
            .run(vec![
                source("index.html", "i"),
                source("$member.html", MEMBER),
                source("about.html", "a"),
            ])
            .unwrap();

        assert_eq!(report.pages.len(), 2 + 3);
        let paths: Vec<_> = report.pages.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "index.html",
                "members/Al.html",
                "members/Bo.html",
                "members/Cy.html",
                "about.html"
            ]
        );
    }

    #[test]
    fn test_all_pages_visible_to_templates() {
        let pipeline = pipeline(json!({}));
        let nav = "---\nall_pages: shadowed\n---\n{% for p in all_pages %}[{{ p.path }}:{{ p.data.title | default(value='-') }}]{% endfor %}";
        let report = pipeline
            .run(vec![
                source("nav.html", nav),
                source("post.html", "---\ntitle: Post\n---\n"),
            ])
            .unwrap();

        assert_eq!(report.rendered[0].contents, "[nav.html:-][post.html:Post]");
    }

    #[test]
    fn test_front_matter_overrides_global_data() {
        let pipeline = pipeline(json!({"title": "Site", "tagline": "hi"}));
        let report = pipeline
            .run(vec![source("page.html", "---\ntitle: Page\n---\n{{ title }} {{ tagline }}")])
            .unwrap();
        assert_eq!(report.rendered[0].contents, "Page hi");
    }

    #[test]
    fn test_template_error_is_isolated() {
        let pipeline = pipeline(json!({}));
        let report = pipeline
            .run(vec![
                source("broken.html", "{{ nope.nope }}"),
                source("fine.html", "ok"),
            ])
            .unwrap();

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.rendered[0].contents, "ok");
        match &report.errors[0] {
            NucleusError::Template { file, template, .. } => {
                assert_eq!(file, &PathBuf::from("/site/html/broken.html"));
                assert_eq!(template, "broken.html");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_mode_aborts_on_template_error() {
        let options = PipelineOptions {
            strict: true,
            ..Default::default()
        };
        let pipeline = Pipeline::builder(options).build().unwrap();
        let err = pipeline
            .run(vec![source("broken.html", "{{ nope.nope }}")])
            .unwrap_err();
        assert!(matches!(err, NucleusError::Template { .. }));
    }

    #[test]
    fn test_front_matter_error_is_isolated() {
        let pipeline = pipeline(json!({}));
        let report = pipeline
            .run(vec![
                source("bad.html", "---\ntitle: [oops\n---\n"),
                source("good.html", "fine"),
            ])
            .unwrap();
        assert_eq!(report.rendered.len(), 1);
        assert!(matches!(
            report.errors[0],
            NucleusError::FrontMatterParse { .. }
        ));
    }

    #[test]
    fn test_runs_are_idempotent() {
        let pipeline = pipeline(json!({"team": [{"name": "Al"}, {"name": "Bo"}]}));
        let files = vec![source("$member.html", MEMBER), source("index.html", "x")];

        let first = pipeline.prepare(files.clone()).unwrap();
        let second = pipeline.prepare(files).unwrap();
        assert_eq!(first.pages, second.pages);
        assert_eq!(first.snapshot.entries(), second.snapshot.entries());
    }

    #[test]
    fn test_data_directory_is_loaded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("team.yaml"), "- name: Al\n").unwrap();
        let options = PipelineOptions {
            data_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let pipeline = Pipeline::new(options).unwrap();
        let report = pipeline
            .run(vec![source("$member.html", MEMBER)])
            .unwrap();
        assert_eq!(report.rendered[0].relative, "members/Al.html");
    }

    #[test]
    fn test_template_root_shared_with_sources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("_layouts")).unwrap();
        fs::write(
            dir.path().join("_layouts/base.html"),
            "<main>{% block body %}{% endblock %}</main>",
        )
        .unwrap();
        let about = "---\ntitle: About\n---\n{% extends \"_layouts/base.html\" %}{% block body %}{{ title }}{% endblock %}";
        fs::write(dir.path().join("about.html"), about).unwrap();

        let options = PipelineOptions {
            template_root_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let pipeline = Pipeline::new(options).unwrap();
        let report = pipeline
            .run(vec![SourceFile::new(dir.path(), "about.html", about.to_string())])
            .unwrap();

        assert!(!report.has_errors());
        assert_eq!(report.rendered[0].contents, "<main>About</main>");
    }

    #[test]
    fn test_escaping_filename_is_isolated() {
        let pipeline = pipeline(json!({"team": [{"name": "../../escape"}]}));
        let member = "---\ngenerate:\n  collection: team\n  variable: person\n  filename: \"{{person.name}}.html\"\n---\n";
        let report = pipeline
            .run(vec![
                source("$member.html", member),
                source("index.html", "home"),
            ])
            .unwrap();

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.rendered[0].relative, "index.html");
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0], NucleusError::InvalidGenerator { .. }));
    }

    #[test]
    fn test_malformed_data_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("team.yaml"), "- name: [Al\n").unwrap();
        let options = PipelineOptions {
            data_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let err = Pipeline::new(options).err().unwrap();
        assert!(matches!(err, NucleusError::DataLoad { .. }));
    }

    #[test]
    fn test_setup_hook_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pipeline = Pipeline::builder(PipelineOptions::default())
            .setup_renderer(move |tera| {
                counter.fetch_add(1, Ordering::SeqCst);
                tera.register_filter(
                    "shout",
                    |v: &tera::Value,
                     _: &HashMap<String, tera::Value>|
                     -> tera::Result<tera::Value> {
                        let s = v.as_str().unwrap_or_default();
                        Ok(tera::Value::String(s.to_uppercase()))
                    },
                );
            })
            .build()
            .unwrap();

        let report = pipeline
            .run(vec![source("a.html", "{{ 'hey' | shout }}")])
            .unwrap();
        assert_eq!(report.rendered[0].contents, "HEY");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    struct EchoRenderer;

    impl Renderer for EchoRenderer {
        fn render(&self, name: &str, _source: &str, context: &Mapping) -> anyhow::Result<String> {
            Ok(format!("{name}:{}", context.len()))
        }

        fn render_string(&self, template: &str, _context: &Mapping) -> anyhow::Result<String> {
            Ok(template.to_string())
        }
    }

    #[test]
    fn test_renderer_override() {
        let pipeline = Pipeline::builder(PipelineOptions::default())
            .global_data(global(json!({"site": "S"})))
            .renderer(EchoRenderer)
            .build()
            .unwrap();
        let report = pipeline.run(vec![source("x.html", "ignored")]).unwrap();
        // `site` plus `all_pages`
        assert_eq!(report.rendered[0].contents, "x.html:2");
    }
}
