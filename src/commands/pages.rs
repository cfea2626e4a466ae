//! List the pages a build would produce

use anyhow::Result;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::error::NucleusError;
use crate::Nucleus;

/// Print every page in the registry, with its title when present
pub fn run(nucleus: &Nucleus) -> Result<()> {
    let prepared = super::build::prepare(nucleus)?;

    println!("Pages ({}):", prepared.snapshot.len());
    for entry in prepared.snapshot.entries() {
        match entry.metadata.get("title").and_then(|t| t.as_str()) {
            Some(title) => println!("  {} - {}", entry.path, title),
            None => println!("  {}", entry.path),
        }
    }

    if !prepared.errors.is_empty() {
        println!("Errors ({}):", prepared.errors.len());
        for (file, errors) in group_by_file(&prepared.errors) {
            match file {
                Some(file) => println!("  {}", display_path(file, &nucleus.source_dir)),
                None => println!("  (no file)"),
            }
            for err in errors {
                println!("    {}", err);
            }
        }
    }

    Ok(())
}

/// Group errors by the source file they belong to, in first-seen order
fn group_by_file(errors: &[NucleusError]) -> IndexMap<Option<&PathBuf>, Vec<&NucleusError>> {
    let mut groups: IndexMap<_, Vec<_>> = IndexMap::new();
    for err in errors {
        groups.entry(err.file()).or_default().push(err);
    }
    groups
}

fn display_path(file: &Path, source_dir: &Path) -> String {
    crate::content::to_slash(file.strip_prefix(source_dir).unwrap_or(file))
}
