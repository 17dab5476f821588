//! `kidshelf discover` - scan the provider's ranked pages for new candidates.

use anyhow::{Context, Result};
use kidshelf_core::pipeline::discover::{discover_new_with_progress, DiscoveryReport};
use kidshelf_core::provider::{DiscoverQuery, MetadataClient};
use kidshelf_core::{Catalog, Config, MediaKind, StagingStore};
use std::collections::HashSet;

pub fn run(config: &Config) -> Result<()> {
    let catalog = Catalog::load(config.catalog_path()).context("failed to load catalog")?;
    let known_ids = catalog.known_tmdb_ids();
    let legacy_titles = catalog.legacy_titles();

    println!(
        "Catalog: {} show(s), {} known provider id(s), {} legacy title(s)",
        catalog.len(),
        known_ids.len(),
        legacy_titles.len()
    );

    let client =
        MetadataClient::new(&config.provider).context("failed to create provider client")?;

    let mut items = Vec::new();
    let targets = [
        (MediaKind::Tv, config.discovery.tv_target),
        (MediaKind::Movie, config.discovery.movie_target),
    ];

    for (media_type, target) in targets {
        let report = scan(&client, config, media_type, target, &known_ids, &legacy_titles);
        print_scan(media_type, target, &report);
        tracing::info!(
            media_type = media_type.as_str(),
            collected = report.items.len(),
            pages = report.pages_scanned,
            known_skipped = report.known_skipped,
            "discovery scan complete"
        );
        items.extend(report.items);
    }

    let store = StagingStore::new(config.staging_dir());
    store
        .save_discovered(&items)
        .context("failed to save discovery output")?;

    println!(
        "\nSaved {} candidate(s) to {}",
        items.len(),
        store.discovered_path().display()
    );
    println!("Next: kidshelf enrich");
    Ok(())
}

fn scan(
    client: &MetadataClient,
    config: &Config,
    media_type: MediaKind,
    target: usize,
    known_ids: &HashSet<u64>,
    legacy_titles: &HashSet<String>,
) -> DiscoveryReport {
    println!("\nScanning {} pages (target: {} new)...", media_type.as_str(), target);

    let source = DiscoverQuery::new(client, media_type, &config.discovery);
    let pb = super::progress_bar(0);

    let report = discover_new_with_progress(
        &source,
        media_type,
        known_ids,
        legacy_titles,
        target,
        config.discovery.max_pages,
        |current, total| {
            pb.set_length(total as u64);
            pb.set_position(current as u64);
            pb.set_message(format!("page {}/{}", current, total));
        },
    );
    pb.finish_and_clear();
    report
}

fn print_scan(media_type: MediaKind, target: usize, report: &DiscoveryReport) {
    println!(
        "  {}: {} new (target {}), {} page(s) scanned",
        media_type.as_str(),
        report.items.len(),
        target,
        report.pages_scanned
    );
    println!(
        "  skipped: {} already in catalog, {} repeated in this run",
        report.known_skipped, report.duplicates_skipped
    );
    if report.legacy_upgrades > 0 {
        println!(
            "  {} candidate(s) upgrade a legacy catalog entry",
            report.legacy_upgrades
        );
    }
    if let Some((page, error)) = &report.aborted {
        println!("  Warning: stopped early at page {}: {}", page, error);
    }
}
