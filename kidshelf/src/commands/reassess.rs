//! `kidshelf reassess` - re-run the safety check on Unsafe catalog entries.
//!
//! The catalog is backed up before any patching.

use anyhow::{Context, Result};
use kidshelf_core::pipeline::reassess::{needs_reassessment, reassess_in_place};
use kidshelf_core::safety::GeminiClient;
use kidshelf_core::{Catalog, Config};

use crate::prompt;

pub fn run(config: &Config, yes: bool) -> Result<()> {
    let mut catalog =
        Catalog::load_required(config.catalog_path()).context("failed to load catalog")?;

    let due = catalog.shows.iter().filter(|s| needs_reassessment(s)).count();
    if due == 0 {
        println!("No Unsafe entries in the catalog; nothing to reassess.");
        return Ok(());
    }

    println!("{} Unsafe entr(ies) due for reassessment.", due);
    if !yes && !prompt::confirm("Reassess them now?")? {
        println!("Aborted.");
        return Ok(());
    }

    let client =
        GeminiClient::new(&config.assessment).context("failed to create assessment client")?;

    let backup = catalog.write_backup().context("failed to back up catalog")?;
    println!("Backup written to {}", backup.display());

    let pb = super::progress_bar(due as u64);
    let outcome = reassess_in_place(&mut catalog, &client, |current, _, title| {
        pb.set_position(current as u64);
        pb.set_message(title.to_string());
    });
    pb.finish_and_clear();

    catalog.save().context("failed to save catalog")?;

    println!("\nReassessment complete:");
    println!("  Examined: {}", outcome.examined);
    println!("  Rating changes: {}", outcome.changes.len());
    for change in &outcome.changes {
        println!(
            "    {}: {} -> {}",
            change.title,
            change.old_rating.as_str(),
            change.new_rating.as_str()
        );
    }
    println!("  Unchanged: {}", outcome.unchanged);
    if !outcome.failures.is_empty() {
        println!("  Failures ({}):", outcome.failures.len());
        for (title, error) in &outcome.failures {
            println!("    - {}: {}", title, error);
        }
    }

    tracing::info!(
        examined = outcome.examined,
        changed = outcome.changes.len(),
        failed = outcome.failures.len(),
        "reassessment complete"
    );
    Ok(())
}
