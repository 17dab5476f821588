//! Discovery & deduplication engine
//!
//! The provider has no "since last sync" filter, so every run re-scans the
//! ranked result pages and excludes catalog-known items client-side. Items
//! whose normalized title matches a legacy catalog entry (one without an
//! external id) are still collected, marked as upgrade candidates.
//!
//! The scan is fail-soft: a failing page fetch ends the scan early and keeps
//! everything collected from prior pages.

use std::collections::HashSet;

use crate::catalog::normalize_title;
use crate::provider::PagedSource;
use crate::types::{DiscoveredItem, MediaKind};

/// Outcome of one discovery scan.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Collected items, in the source's native ranking order
    pub items: Vec<DiscoveredItem>,
    /// Pages successfully fetched
    pub pages_scanned: usize,
    /// Results dropped because the catalog already knows their id
    pub known_skipped: usize,
    /// Results dropped because the same id appeared earlier this run
    pub duplicates_skipped: usize,
    /// Collected items that upgrade a legacy catalog entry
    pub legacy_upgrades: usize,
    /// Set when a page fetch failed and the scan stopped early
    pub aborted: Option<(usize, String)>,
}

/// Scan pages until `target_count` new items are collected, the source runs
/// out of pages, or `max_pages` is hit. Results are consumed in the source's
/// native ranking order; first seen wins for duplicate ids within a run.
pub fn discover_new(
    source: &dyn PagedSource,
    media_type: MediaKind,
    known_ids: &HashSet<u64>,
    legacy_titles: &HashSet<String>,
    target_count: usize,
    max_pages: usize,
) -> DiscoveryReport {
    discover_new_with_progress(
        source,
        media_type,
        known_ids,
        legacy_titles,
        target_count,
        max_pages,
        |_, _| {},
    )
}

/// Like [`discover_new`], reporting (current_page, total_pages) after each
/// fetched page.
pub fn discover_new_with_progress(
    source: &dyn PagedSource,
    media_type: MediaKind,
    known_ids: &HashSet<u64>,
    legacy_titles: &HashSet<String>,
    target_count: usize,
    max_pages: usize,
    mut on_page: impl FnMut(usize, usize),
) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();
    let mut seen_this_run: HashSet<u64> = HashSet::new();

    if target_count == 0 || max_pages == 0 {
        return report;
    }

    let mut page = 1;

    loop {
        let data = match source.fetch_page(page) {
            Ok(data) => data,
            Err(e) => {
                // Fail-soft: keep what prior pages produced.
                tracing::warn!(page, error = %e, "page fetch failed, stopping scan early");
                report.aborted = Some((page, e.to_string()));
                return report;
            }
        };

        report.pages_scanned += 1;
        let last_page = data.total_pages.min(max_pages).max(1);
        on_page(page, last_page);

        for result in data.results {
            // Overlapping pagination can repeat ids within a run; first seen wins.
            if !seen_this_run.insert(result.id) {
                report.duplicates_skipped += 1;
                continue;
            }
            if known_ids.contains(&result.id) {
                report.known_skipped += 1;
                continue;
            }

            let mut item = result.into_discovered(media_type);
            if legacy_titles.contains(&normalize_title(&item.title)) {
                item.legacy_upgrade = true;
                report.legacy_upgrades += 1;
            }
            report.items.push(item);

            if report.items.len() >= target_count {
                return report;
            }
        }

        if page >= last_page {
            return report;
        }
        page += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::provider::{DiscoverPage, DiscoverResult};

    /// Source backed by canned pages; pages listed as `Err` fail on fetch.
    struct FakeSource {
        pages: Vec<Result<Vec<u64>>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Result<Vec<u64>>>) -> Self {
            Self { pages }
        }
    }

    impl PagedSource for FakeSource {
        fn fetch_page(&self, page: usize) -> Result<DiscoverPage> {
            match self.pages.get(page - 1) {
                Some(Ok(ids)) => Ok(DiscoverPage {
                    page,
                    total_pages: self.pages.len(),
                    total_results: 0,
                    results: ids.iter().map(|id| result_with_id(*id)).collect(),
                }),
                Some(Err(_)) => Err(Error::Provider(format!("page {} unavailable", page))),
                None => Ok(DiscoverPage {
                    page,
                    total_pages: self.pages.len(),
                    total_results: 0,
                    results: vec![],
                }),
            }
        }
    }

    fn result_with_id(id: u64) -> DiscoverResult {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Show {}", id),
            "overview": "",
            "vote_average": 7.0,
            "vote_count": 50,
            "popularity": 10.0,
            "genre_ids": [16]
        }))
        .unwrap()
    }

    fn no_known() -> HashSet<u64> {
        HashSet::new()
    }

    fn no_legacy() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn excludes_catalog_known_ids() {
        let source = FakeSource::new(vec![Ok(vec![41, 42, 43])]);
        let known = [42].into();

        let report = discover_new(&source, MediaKind::Tv, &known, &no_legacy(), 10, 50);
        let ids: Vec<u64> = report.items.iter().map(|i| i.tmdb_id).collect();
        assert_eq!(ids, vec![41, 43]);
        assert_eq!(report.known_skipped, 1);
    }

    #[test]
    fn same_id_within_run_appears_once() {
        let source = FakeSource::new(vec![Ok(vec![1, 2]), Ok(vec![2, 3])]);

        let report = discover_new(&source, MediaKind::Tv, &no_known(), &no_legacy(), 10, 50);
        let ids: Vec<u64> = report.items.iter().map(|i| i.tmdb_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(report.duplicates_skipped, 1);
    }

    #[test]
    fn stops_at_target_count() {
        let source = FakeSource::new(vec![Ok(vec![1, 2, 3]), Ok(vec![4, 5, 6])]);

        let report = discover_new(&source, MediaKind::Tv, &no_known(), &no_legacy(), 4, 50);
        assert_eq!(report.items.len(), 4);
        // Target hit mid-page-2: no further pages fetched.
        assert_eq!(report.pages_scanned, 2);
    }

    #[test]
    fn honors_page_cap() {
        let source = FakeSource::new(vec![Ok(vec![1]), Ok(vec![2]), Ok(vec![3])]);

        let report = discover_new(&source, MediaKind::Tv, &no_known(), &no_legacy(), 100, 2);
        assert_eq!(report.pages_scanned, 2);
        assert_eq!(report.items.len(), 2);
    }

    #[test]
    fn failing_page_keeps_prior_results() {
        let source = FakeSource::new(vec![
            Ok(vec![1, 2]),
            Err(Error::Provider("boom".to_string())),
            Ok(vec![3]),
        ]);

        let report = discover_new(&source, MediaKind::Tv, &no_known(), &no_legacy(), 10, 50);
        assert_eq!(report.items.len(), 2);
        let (page, _) = report.aborted.as_ref().expect("scan should record abort");
        assert_eq!(*page, 2);
    }

    #[test]
    fn marks_legacy_title_matches_as_upgrades() {
        let source = FakeSource::new(vec![Ok(vec![7, 8])]);
        let legacy = [normalize_title("Show 7")].into();

        let report = discover_new(&source, MediaKind::Tv, &no_known(), &legacy, 10, 50);
        assert!(report.items[0].legacy_upgrade);
        assert!(!report.items[1].legacy_upgrade);
        assert_eq!(report.legacy_upgrades, 1);
    }
}
