//! Clean the output directory

use anyhow::Result;
use std::fs;

use crate::Nucleus;

/// Remove the output directory
pub fn run(nucleus: &Nucleus) -> Result<()> {
    if nucleus.output_dir.exists() {
        fs::remove_dir_all(&nucleus.output_dir)?;
        tracing::info!("Deleted: {:?}", nucleus.output_dir);
    }
    Ok(())
}
