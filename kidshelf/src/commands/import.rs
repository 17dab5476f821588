//! `kidshelf import` - merge reviewed candidates into the catalog.
//!
//! Planning and mutation are separate passes: the plan is previewed (and
//! confirmed, unless --yes) before the catalog file is touched.

use anyhow::{Context, Result};
use kidshelf_core::pipeline::import_merge::{
    apply_plan, plan_import, ImportAction, SkipReason,
};
use kidshelf_core::{Catalog, Config, StagingStore};

use crate::prompt;

const PREVIEW_ROWS: usize = 10;

pub fn run(config: &Config, overwrite: bool, yes: bool) -> Result<()> {
    let store = StagingStore::new(config.staging_dir());
    let reviewed = store.require_reviewed()?;

    if reviewed.is_empty() {
        println!("No reviewed items to import.");
        return Ok(());
    }

    let mut catalog = Catalog::load(config.catalog_path()).context("failed to load catalog")?;
    let plan = plan_import(&catalog, &reviewed, overwrite);

    println!("Import plan for {} reviewed item(s):", reviewed.len());
    println!("  Add: {}", plan.added);
    println!("  Replace: {}", plan.replaced);
    println!("  Skip: {}", plan.skipped);

    for decision in plan.decisions.iter().take(PREVIEW_ROWS) {
        let label = match decision.action {
            ImportAction::Add => "add".to_string(),
            ImportAction::Replace(pos) => format!("replace #{}", pos),
            ImportAction::Skip(SkipReason::ExistingKept) => "skip (already in catalog)".to_string(),
            ImportAction::Skip(SkipReason::AmbiguousTitle) => {
                "skip (ambiguous title, resolve by hand)".to_string()
            }
        };
        println!("    {} -> {}", decision.record.title, label);
    }
    if plan.decisions.len() > PREVIEW_ROWS {
        println!("    ... and {} more", plan.decisions.len() - PREVIEW_ROWS);
    }

    if plan.is_noop() {
        println!("\nNothing to import.");
        return Ok(());
    }

    if !yes && !prompt::confirm(&format!("\nApply to {}?", catalog.path().display()))? {
        println!("Aborted.");
        return Ok(());
    }

    let (added, replaced) = (plan.added, plan.replaced);
    apply_plan(&mut catalog, plan);
    catalog.save().context("failed to save catalog")?;

    tracing::info!(added, replaced, total = catalog.len(), "import complete");
    println!(
        "Imported: {} added, {} replaced. Catalog now has {} show(s).",
        added,
        replaced,
        catalog.len()
    );
    println!("Run kidshelf reset to clear the staging files.");
    Ok(())
}
