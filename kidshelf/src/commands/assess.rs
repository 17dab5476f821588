//! `kidshelf assess` - run the AI safety assessment over enriched candidates.
//!
//! Resumable: output is flushed after every verdict, and re-running skips
//! items that already carry one.

use anyhow::{Context, Result};
use kidshelf_core::pipeline::assess::run_assessments;
use kidshelf_core::safety::GeminiClient;
use kidshelf_core::{Config, StagingStore};

pub fn run(config: &Config) -> Result<()> {
    let store = StagingStore::new(config.staging_dir());
    let enriched = store.require_enriched()?;
    let existing = store.load_assessed_or_empty()?;

    let client =
        GeminiClient::new(&config.assessment).context("failed to create assessment client")?;

    println!(
        "Assessing {} candidate(s) ({} already done)...",
        enriched.len(),
        existing.len()
    );
    let pb = super::progress_bar(0);

    let (assessed, report) = run_assessments(
        &enriched,
        existing,
        &client,
        config.assessment.batch_limit,
        |items| store.save_assessed(items),
        |current, total, title| {
            pb.set_length(total as u64);
            pb.set_position(current as u64);
            pb.set_message(title.to_string());
        },
    )?;
    pb.finish_and_clear();

    store
        .save_assessed(&assessed)
        .context("failed to save assessment output")?;

    println!("\nAssessment complete:");
    println!("  Reused from prior runs: {}", report.reused);
    println!("  Newly assessed: {}", report.newly_assessed);
    println!("  Flagged for review: {}", report.flagged_total);
    if !report.failed.is_empty() {
        println!("  Failed ({}):", report.failed.len());
        for (title, error) in &report.failed {
            println!("    - {}: {}", title, error);
        }
    }
    if report.deferred_by_cap > 0 {
        println!(
            "  Deferred by batch limit ({}): {}",
            config.assessment.batch_limit, report.deferred_by_cap
        );
    }
    if report.remaining_pending() > 0 {
        println!(
            "\n{} item(s) still pending. Run kidshelf assess again to continue.",
            report.remaining_pending()
        );
    } else {
        println!("\nNext: kidshelf review");
    }

    tracing::info!(
        reused = report.reused,
        newly_assessed = report.newly_assessed,
        failed = report.failed.len(),
        deferred = report.deferred_by_cap,
        flagged = report.flagged_total,
        "assessment complete"
    );
    Ok(())
}
