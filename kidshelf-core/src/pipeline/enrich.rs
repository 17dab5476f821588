//! Enrichment stage
//!
//! One detail fetch per discovered item, flattened into an [`EnrichedItem`].
//! Items without a resolvable IMDb id are dropped here: everything
//! downstream keys on it. Per-item failures are collected for visibility and
//! never abort the batch.

use crate::format::{format_runtime, movie_year, tv_year_range};
use crate::provider::{MetadataClient, TitleDetails};
use crate::types::{DiscoveredItem, EnrichedItem, MediaKind};

/// Outcome of one enrichment run.
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    pub items: Vec<EnrichedItem>,
    /// Items dropped for lacking an IMDb id
    pub missing_imdb: Vec<String>,
    /// Per-item fetch failures (title, error)
    pub errors: Vec<(String, String)>,
}

/// Assemble an [`EnrichedItem`] from a detail payload.
///
/// Returns `None` when the payload carries no IMDb id; the item cannot enter
/// the assessment stage without one.
pub fn build_enriched(
    discovered: &DiscoveredItem,
    details: &TitleDetails,
    cover_image_url: String,
    region: &str,
) -> Option<EnrichedItem> {
    let imdb_id = details
        .external_ids
        .imdb_id
        .clone()
        .filter(|id| !id.is_empty())?;

    let cast: Vec<String> = details
        .credits
        .cast
        .iter()
        .take(3)
        .map(|c| c.name.clone())
        .collect();
    let genres: Vec<String> = details.genres.iter().map(|g| g.name.clone()).collect();

    let release_year = match discovered.media_type {
        MediaKind::Tv => tv_year_range(
            &details.first_air_date,
            &details.last_air_date,
            &details.status,
        ),
        MediaKind::Movie => movie_year(&details.release_date),
    };
    let runtime = format_runtime(details.runtime_minutes(discovered.media_type));

    Some(EnrichedItem {
        tmdb_id: discovered.tmdb_id,
        media_type: discovered.media_type,
        title: discovered.title.clone(),
        synopsis: details
            .overview
            .clone()
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| discovered.overview.clone()),
        cover_image_url,
        imdb_id: Some(imdb_id),
        release_year: (!release_year.is_empty()).then_some(release_year),
        runtime: (!runtime.is_empty()).then_some(runtime),
        cast,
        genres,
        certification: details.certification(discovered.media_type, region),
        platforms: details.platforms(region),
        popularity: discovered.popularity,
        vote_average: discovered.vote_average,
    })
}

/// Enrich a batch, reporting progress per item.
pub fn enrich_batch(
    client: &MetadataClient,
    discovered: &[DiscoveredItem],
    region: &str,
    mut on_item: impl FnMut(usize, usize, &str),
) -> EnrichmentReport {
    let mut report = EnrichmentReport::default();

    for (index, item) in discovered.iter().enumerate() {
        on_item(index, discovered.len(), &item.title);

        let details = match client.details(item.media_type, item.tmdb_id) {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(title = %item.title, error = %e, "detail fetch failed, skipping item");
                report.errors.push((item.title.clone(), e.to_string()));
                continue;
            }
        };

        let cover = client.image_url(details.poster_path.as_deref());
        match build_enriched(item, &details, cover, region) {
            Some(enriched) => report.items.push(enriched),
            None => {
                tracing::warn!(title = %item.title, "no IMDb id, dropping item");
                report.missing_imdb.push(item.title.clone());
            }
        }
    }

    report
}
