//! End-to-end pipeline test over a temp staging directory.
//!
//! Drives all four stages with in-memory fakes for the two network seams
//! (paged discovery and the safety client), persisting each stage through
//! the staging store exactly the way the CLI does, then merges into the
//! catalog and reassesses it.

use chrono::Utc;
use kidshelf_core::pipeline::assess::run_assessments;
use kidshelf_core::pipeline::discover::discover_new;
use kidshelf_core::pipeline::import_merge::{apply_plan, plan_import};
use kidshelf_core::pipeline::reassess::reassess_in_place;
use kidshelf_core::pipeline::review::auto_review;
use kidshelf_core::provider::{DiscoverPage, DiscoverResult, PagedSource};
use kidshelf_core::safety::{SafetyClient, SafetyRequest};
use kidshelf_core::{
    AiAssessment, Catalog, EnrichedItem, MediaKind, SafetyRating, StagingStore, StimulationLevel,
};
use std::collections::HashSet;
use tempfile::TempDir;

struct OnePageSource {
    ids: Vec<u64>,
}

impl PagedSource for OnePageSource {
    fn fetch_page(&self, page: usize) -> kidshelf_core::Result<DiscoverPage> {
        assert_eq!(page, 1);
        let results = self
            .ids
            .iter()
            .map(|&id| DiscoverResult {
                id,
                name: Some(format!("Show {}", id)),
                title: None,
                original_name: None,
                original_title: None,
                overview: "A gentle show for small viewers.".to_string(),
                poster_path: None,
                first_air_date: None,
                release_date: None,
                vote_average: 7.5,
                vote_count: 120,
                popularity: 50.0,
                genre_ids: vec![16, 10762],
            })
            .collect();
        Ok(DiscoverPage {
            page: 1,
            total_pages: 1,
            total_results: self.ids.len() as u64,
            results,
        })
    }
}

struct ScriptedSafety {
    unsafe_titles: Vec<String>,
}

impl SafetyClient for ScriptedSafety {
    fn assess(&self, request: &SafetyRequest) -> kidshelf_core::Result<AiAssessment> {
        let bad = self.unsafe_titles.contains(&request.title);
        Ok(AiAssessment {
            rating: if bad {
                SafetyRating::Unsafe
            } else {
                SafetyRating::Safe
            },
            min_age: 3.0,
            max_age: 8.0,
            stimulation_level: StimulationLevel::Low,
            has_lgbtq: false,
            has_violence: bad,
            has_scary: false,
            is_educational: true,
            reasoning: "Calm pacing, clear prosocial lessons, no frightening imagery.".to_string(),
            safe_above_age: None,
            is_episodic_issue: false,
        })
    }
}

/// Enrichment normally needs the provider's detail endpoint; here the detail
/// flattening is simulated directly.
fn enrich(item: &kidshelf_core::DiscoveredItem, n: u64) -> EnrichedItem {
    EnrichedItem {
        tmdb_id: item.tmdb_id,
        media_type: item.media_type,
        title: item.title.clone(),
        synopsis: item.overview.clone(),
        cover_image_url: String::new(),
        imdb_id: Some(format!("tt{:07}", n)),
        release_year: Some("2020".to_string()),
        runtime: Some("11 min".to_string()),
        cast: vec!["Voice Actor".to_string()],
        genres: vec!["Animation".to_string(), "Kids".to_string()],
        certification: Some("TV-Y".to_string()),
        platforms: vec!["Netflix".to_string()],
        popularity: item.popularity,
        vote_average: item.vote_average,
    }
}

#[test]
fn full_pipeline_from_discovery_to_reassessment() {
    let dir = TempDir::new().unwrap();
    let store = StagingStore::new(dir.path().join("staging"));
    let catalog_path = dir.path().join("shows.json");

    // Stage 1: discover against an empty catalog.
    let source = OnePageSource {
        ids: vec![101, 102, 103],
    };
    let report = discover_new(
        &source,
        MediaKind::Tv,
        &HashSet::new(),
        &HashSet::new(),
        10,
        5,
    );
    assert_eq!(report.items.len(), 3);
    assert!(report.aborted.is_none());
    store.save_discovered(&report.items).unwrap();

    // Stage 2: enrich (detail fetch simulated).
    let discovered = store.require_discovered().unwrap();
    let enriched: Vec<EnrichedItem> = discovered
        .iter()
        .enumerate()
        .map(|(n, item)| enrich(item, n as u64 + 1))
        .collect();
    store.save_enriched(&enriched).unwrap();

    // Stage 3: assess; "Show 103" comes back Unsafe.
    let client = ScriptedSafety {
        unsafe_titles: vec!["Show 103".to_string()],
    };
    let enriched = store.require_enriched().unwrap();
    let existing = store.load_assessed_or_empty().unwrap();
    let (assessed, report) = run_assessments(
        &enriched,
        existing,
        &client,
        0,
        |items| store.save_assessed(items),
        |_, _, _| {},
    )
    .unwrap();
    assert_eq!(report.newly_assessed, 3);
    assert_eq!(report.flagged_total, 1);
    store.save_assessed(&assessed).unwrap();

    // Re-running the stage reuses everything.
    let again = store.load_assessed_or_empty().unwrap();
    let (_, rerun) =
        run_assessments(&enriched, again, &client, 0, |_| Ok(()), |_, _, _| {}).unwrap();
    assert_eq!(rerun.reused, 3);
    assert_eq!(rerun.newly_assessed, 0);

    // Stage 4: automated review approves all three.
    let assessed = store.require_assessed().unwrap();
    let reviewed = auto_review(&assessed, &store.load_reviewed_or_empty().unwrap(), Utc::now());
    assert_eq!(reviewed.len(), 3);
    store.save_reviewed(&reviewed).unwrap();

    // Import into a fresh catalog.
    let mut catalog = Catalog::load(&catalog_path).unwrap();
    let plan = plan_import(&catalog, &store.require_reviewed().unwrap(), false);
    assert_eq!(plan.added, 3);
    apply_plan(&mut catalog, plan);
    catalog.save().unwrap();

    let catalog = Catalog::load_required(&catalog_path).unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.known_tmdb_ids(), [101, 102, 103].into());

    // A second discovery run skips everything the catalog now knows.
    let report = discover_new(
        &source,
        MediaKind::Tv,
        &catalog.known_tmdb_ids(),
        &catalog.legacy_titles(),
        10,
        5,
    );
    assert!(report.items.is_empty());
    assert_eq!(report.known_skipped, 3);

    // Maintenance: the one Unsafe record gets a second look and clears.
    let mut catalog = Catalog::load_required(&catalog_path).unwrap();
    let clearing_client = ScriptedSafety {
        unsafe_titles: vec![],
    };
    let outcome = reassess_in_place(&mut catalog, &clearing_client, |_, _, _| {});
    assert_eq!(outcome.examined, 1);
    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes[0].new_rating, SafetyRating::Safe);
    catalog.save().unwrap();

    let catalog = Catalog::load_required(&catalog_path).unwrap();
    assert!(catalog.shows.iter().all(|s| s.rating == SafetyRating::Safe));

    // Reset clears staging, not the catalog.
    assert_eq!(store.reset().unwrap(), 4);
    assert!(store.existing_files().is_empty());
    assert!(catalog_path.exists());
}
