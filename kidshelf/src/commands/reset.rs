//! `kidshelf reset` - delete the intermediate stage files.
//!
//! The catalog is never touched.

use anyhow::{Context, Result};
use kidshelf_core::{Config, StagingStore};

use crate::prompt;

pub fn run(config: &Config, yes: bool) -> Result<()> {
    let store = StagingStore::new(config.staging_dir());

    let existing = store.existing_files();
    if existing.is_empty() {
        println!("No stage files to remove.");
        return Ok(());
    }

    println!("Stage files:");
    for path in &existing {
        println!("  {}", path.display());
    }

    if !yes && !prompt::confirm("Delete these files?")? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = store.reset().context("failed to remove stage files")?;
    tracing::info!(removed, "staging reset");
    println!("Removed {} file(s). The catalog was not touched.", removed);
    Ok(())
}
