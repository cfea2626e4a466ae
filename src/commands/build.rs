//! Build: discover source files, run the pipeline, write the output

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::{to_slash, SourceFile};
use crate::pipeline::{Pipeline, RenderedFile, RunReport};
use crate::Nucleus;

/// Build the site and write every rendered page
pub fn run(nucleus: &Nucleus) -> Result<RunReport> {
    let start = std::time::Instant::now();

    let pipeline = nucleus.pipeline()?;
    tracing::info!("Loaded {} global data sets", pipeline.global_data().len());
    let files = discover(&nucleus.source_dir, &nucleus.pattern)?;
    tracing::info!("Found {} source files", files.len());

    let report = pipeline.run(files)?;
    write_outputs(&nucleus.output_dir, &report.rendered)?;

    let duration = start.elapsed();
    tracing::info!(
        "Wrote {} pages in {:.2}s",
        report.rendered.len(),
        duration.as_secs_f64()
    );

    Ok(report)
}

/// Run the pipeline up to the page registry without rendering
pub fn prepare(nucleus: &Nucleus) -> Result<crate::pipeline::PreparedRun> {
    let pipeline: Pipeline = nucleus.pipeline()?;
    let files = discover(&nucleus.source_dir, &nucleus.pattern)?;
    Ok(pipeline.prepare(files)?)
}

/// Collect source files below `source_dir` matching `pattern`
///
/// Files are returned in sorted path order. Anything below a directory or
/// file whose name starts with `_` or `.` is skipped (partials, layouts).
pub fn discover(source_dir: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    if !source_dir.exists() {
        anyhow::bail!("Source directory not found: {:?}", source_dir);
    }

    let pattern =
        Pattern::new(pattern).with_context(|| format!("Invalid source pattern `{}`", pattern))?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut files = Vec::new();

    for entry in WalkDir::new(source_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let relative = path.strip_prefix(source_dir)?;
        let should_skip = relative.components().any(|c| {
            c.as_os_str()
                .to_str()
                .map(|s| s.starts_with('_') || s.starts_with('.'))
                .unwrap_or(false)
        });
        if should_skip || !pattern.matches_with(&to_slash(relative), options) {
            continue;
        }

        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        files.push(SourceFile::new(source_dir, path, contents));
    }

    Ok(files)
}

/// Write rendered files below `output_dir`
pub fn write_outputs(output_dir: &Path, rendered: &[RenderedFile]) -> Result<()> {
    for file in rendered {
        let dest = output_dir.join(&file.relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, &file.contents)
            .with_context(|| format!("Failed to write {:?}", dest))?;
        tracing::debug!("Wrote: {:?} -> {:?}", file.source, dest);
    }
    Ok(())
}
