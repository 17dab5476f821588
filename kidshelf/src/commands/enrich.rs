//! `kidshelf enrich` - fetch full metadata for each discovered candidate.

use anyhow::{Context, Result};
use kidshelf_core::pipeline::enrich::enrich_batch;
use kidshelf_core::provider::MetadataClient;
use kidshelf_core::{Config, StagingStore};

pub fn run(config: &Config) -> Result<()> {
    let store = StagingStore::new(config.staging_dir());
    let discovered = store.require_discovered()?;

    if discovered.is_empty() {
        println!("No discovered candidates to enrich.");
        return Ok(());
    }

    let client =
        MetadataClient::new(&config.provider).context("failed to create provider client")?;

    println!("Enriching {} candidate(s)...", discovered.len());
    let pb = super::progress_bar(discovered.len() as u64);

    let report = enrich_batch(&client, &discovered, &config.discovery.watch_region, |current, _, title| {
        pb.set_position(current as u64);
        pb.set_message(title.to_string());
    });
    pb.finish_and_clear();

    store
        .save_enriched(&report.items)
        .context("failed to save enrichment output")?;

    println!("\nEnrichment complete:");
    println!("  Enriched: {}", report.items.len());
    println!("  Dropped (no IMDb id): {}", report.missing_imdb.len());
    for title in &report.missing_imdb {
        println!("    - {}", title);
    }
    if !report.errors.is_empty() {
        println!("  Errors ({}):", report.errors.len());
        for (title, error) in &report.errors {
            println!("    - {}: {}", title, error);
        }
    }

    tracing::info!(
        enriched = report.items.len(),
        missing_imdb = report.missing_imdb.len(),
        errors = report.errors.len(),
        "enrichment complete"
    );

    println!("\nSaved to {}", store.enriched_path().display());
    println!("Next: kidshelf assess");
    Ok(())
}
