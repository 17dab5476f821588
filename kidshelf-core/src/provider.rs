//! HTTP client for the metadata provider (TMDB API v3)
//!
//! All calls are blocking: the client owns a current-thread tokio runtime and
//! drives reqwest through it, one request at a time. A client-side minimum
//! interval between requests keeps us inside the provider's 40 req/10s
//! budget without reacting to 429s.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::config::{DiscoveryConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::types::{DiscoveredItem, MediaKind};

/// Animation genre id
const GENRE_ANIMATION: u64 = 16;
/// Family genre id
const GENRE_FAMILY: u64 = 10751;
/// Kids genre id (TV only)
const GENRE_KIDS: u64 = 10762;

/// One page of ranked discovery results.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverPage {
    pub page: usize,
    pub total_pages: usize,
    #[serde(default)]
    pub total_results: u64,
    pub results: Vec<DiscoverResult>,
}

/// One candidate record from a discovery page.
///
/// TV and movie payloads name their title fields differently; both sets are
/// kept optional here and resolved in [`DiscoverResult::into_discovered`].
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverResult {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

impl DiscoverResult {
    /// Flatten the tv/movie field split into a [`DiscoveredItem`].
    pub fn into_discovered(self, media_type: MediaKind) -> DiscoveredItem {
        let title = self.name.or(self.title).unwrap_or_default();
        let original_title = self
            .original_name
            .or(self.original_title)
            .unwrap_or_else(|| title.clone());
        DiscoveredItem {
            tmdb_id: self.id,
            media_type,
            title,
            original_title,
            overview: self.overview,
            poster_path: self.poster_path,
            release_date: self.first_air_date.or(self.release_date),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            genre_ids: self.genre_ids,
            legacy_upgrade: false,
        }
    }
}

/// Full detail payload with appended sub-resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleDetails {
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub external_ids: ExternalIds,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(rename = "watch/providers", default)]
    pub watch_providers: WatchProviders,
    /// TV only
    #[serde(default)]
    pub content_ratings: RatingResults,
    /// Movie only
    #[serde(default)]
    pub release_dates: ReleaseDateResults,
    /// TV only
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    /// Movie only
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub first_air_date: String,
    #[serde(default)]
    pub last_air_date: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub release_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchProviders {
    #[serde(default)]
    pub results: std::collections::HashMap<String, RegionProviders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionProviders {
    #[serde(default)]
    pub flatrate: Vec<ProviderEntry>,
    #[serde(default)]
    pub free: Vec<ProviderEntry>,
    #[serde(default)]
    pub ads: Vec<ProviderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub provider_name: Option<String>,
}

/// TV content ratings payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingResults {
    #[serde(default)]
    pub results: Vec<CountryRating>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRating {
    #[serde(default)]
    pub iso_3166_1: String,
    #[serde(default)]
    pub rating: Option<String>,
}

/// Movie release dates payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseDateResults {
    #[serde(default)]
    pub results: Vec<CountryReleases>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryReleases {
    #[serde(default)]
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDate {
    #[serde(default)]
    pub certification: String,
}

impl TitleDetails {
    /// Streaming platform names for a region, from the flatrate/free/ads
    /// buckets, first-seen order, deduplicated.
    pub fn platforms(&self, region: &str) -> Vec<String> {
        let mut platforms = Vec::new();
        if let Some(region_data) = self.watch_providers.results.get(region) {
            for bucket in [&region_data.flatrate, &region_data.free, &region_data.ads] {
                for entry in bucket {
                    if let Some(name) = entry.provider_name.as_deref() {
                        if !name.is_empty() && !platforms.iter().any(|p| p == name) {
                            platforms.push(name.to_string());
                        }
                    }
                }
            }
        }
        platforms
    }

    /// US-style certification (TV-Y, G, PG...), or None when unrated.
    pub fn certification(&self, media_type: MediaKind, region: &str) -> Option<String> {
        match media_type {
            MediaKind::Tv => self
                .content_ratings
                .results
                .iter()
                .find(|r| r.iso_3166_1 == region)
                .and_then(|r| r.rating.clone())
                .filter(|r| !r.is_empty()),
            MediaKind::Movie => self
                .release_dates
                .results
                .iter()
                .find(|c| c.iso_3166_1 == region)
                .and_then(|c| {
                    c.release_dates
                        .iter()
                        .map(|d| d.certification.clone())
                        .find(|cert| !cert.is_empty())
                }),
        }
    }

    /// Runtime in minutes: first episode runtime for TV, feature runtime for
    /// movies.
    pub fn runtime_minutes(&self, media_type: MediaKind) -> Option<u32> {
        match media_type {
            MediaKind::Tv => self.episode_run_time.first().copied(),
            MediaKind::Movie => self.runtime,
        }
    }
}

/// A paged, ranked result source the discovery engine can scan.
///
/// Seam for tests: the engine never talks HTTP directly.
pub trait PagedSource {
    fn fetch_page(&self, page: usize) -> Result<DiscoverPage>;
}

/// Blocking HTTP client for the metadata provider.
pub struct MetadataClient {
    api_key: String,
    base_url: String,
    image_base: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl MetadataClient {
    /// Create a client from configuration.
    ///
    /// Fails fast when no API key is available; the stage performs no work.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Provider(format!("failed to build tokio runtime: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base: config.image_base.trim_end_matches('/').to_string(),
            min_interval: Duration::from_millis(config.min_interval_ms),
            last_request: Mutex::new(None),
            runtime,
            http,
        })
    }

    /// Enforce the minimum inter-request spacing.
    fn throttle(&self) {
        let mut last = self.last_request.lock().unwrap();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        self.throttle();

        let url = format!("{}{}", self.base_url, endpoint);
        self.runtime.block_on(async {
            let mut request = self.http.get(&url).query(&[("api_key", &self.api_key)]);
            for (key, value) in params {
                request = request.query(&[(key, value)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::Provider(format!("HTTP request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_else(|_| "unknown".to_string());
                return Err(Error::Provider(format!("API error ({}): {}", status, body)));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| Error::Provider(format!("failed to parse response: {e}")))
        })
    }

    /// Fetch one ranked discovery page for the given media kind.
    pub fn discover(
        &self,
        media_type: MediaKind,
        page: usize,
        filters: &DiscoveryConfig,
    ) -> Result<DiscoverPage> {
        let endpoint = match media_type {
            MediaKind::Tv => "/discover/tv",
            MediaKind::Movie => "/discover/movie",
        };
        let mut params = vec![
            ("page".to_string(), page.to_string()),
            ("sort_by".to_string(), "popularity.desc".to_string()),
            (
                "vote_count.gte".to_string(),
                filters.min_vote_count.to_string(),
            ),
            (
                "vote_average.gte".to_string(),
                filters.min_vote_average.to_string(),
            ),
            (
                "with_original_language".to_string(),
                filters.language.clone(),
            ),
        ];

        match media_type {
            MediaKind::Tv => {
                params.push((
                    "with_genres".to_string(),
                    format!("{}|{}|{}", GENRE_ANIMATION, GENRE_FAMILY, GENRE_KIDS),
                ));
                params.push((
                    "with_watch_monetization_types".to_string(),
                    "flatrate|free|ads".to_string(),
                ));
                params.push(("watch_region".to_string(), filters.watch_region.clone()));
            }
            MediaKind::Movie => {
                params.push((
                    "with_genres".to_string(),
                    format!("{}|{}", GENRE_ANIMATION, GENRE_FAMILY),
                ));
                params.push((
                    "certification_country".to_string(),
                    filters.watch_region.clone(),
                ));
            }
        }

        if let Some(providers) = &filters.watch_providers {
            params.push(("with_watch_providers".to_string(), providers.clone()));
        }

        self.get_json(endpoint, &params)
    }

    /// Fetch the full detail record with appended sub-resources.
    pub fn details(&self, media_type: MediaKind, tmdb_id: u64) -> Result<TitleDetails> {
        let (endpoint, append) = match media_type {
            MediaKind::Tv => (
                format!("/tv/{}", tmdb_id),
                "external_ids,content_ratings,watch/providers,credits",
            ),
            MediaKind::Movie => (
                format!("/movie/{}", tmdb_id),
                "external_ids,release_dates,watch/providers,credits",
            ),
        };
        let params = vec![(
            "append_to_response".to_string(),
            append.to_string(),
        )];
        self.get_json(&endpoint, &params)
    }

    /// Convert an image path to a full CDN URL (w500 by default).
    pub fn image_url(&self, path: Option<&str>) -> String {
        match path {
            Some(p) if !p.is_empty() => format!("{}/w500{}", self.image_base, p),
            _ => String::new(),
        }
    }
}

/// A concrete discovery scan: one client, one media kind, one filter set.
pub struct DiscoverQuery<'a> {
    client: &'a MetadataClient,
    media_type: MediaKind,
    filters: &'a DiscoveryConfig,
}

impl<'a> DiscoverQuery<'a> {
    pub fn new(
        client: &'a MetadataClient,
        media_type: MediaKind,
        filters: &'a DiscoveryConfig,
    ) -> Self {
        Self {
            client,
            media_type,
            filters,
        }
    }
}

impl PagedSource for DiscoverQuery<'_> {
    fn fetch_page(&self, page: usize) -> Result<DiscoverPage> {
        self.client.discover(self.media_type, page, self.filters)
    }
}
