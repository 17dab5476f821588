//! Stage file persistence
//!
//! Each pipeline stage reads the JSON array left by its predecessor and
//! writes its own, making every stage independently restartable. Files are
//! UTF-8, pretty-printed, and rewritten atomically (write to a temp file in
//! the same directory, then rename) so a killed run never leaves a
//! half-written stage file behind.

use crate::error::{Error, Result};
use crate::types::{AssessedItem, DiscoveredItem, EnrichedItem, ReviewedItem};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const DISCOVERED_FILE: &str = "1_discovered.json";
const ENRICHED_FILE: &str = "2_enriched.json";
const ASSESSED_FILE: &str = "3_assessed.json";
const REVIEWED_FILE: &str = "4_reviewed.json";

/// File-backed store for the four intermediate stage files.
#[derive(Debug, Clone)]
pub struct StagingStore {
    dir: PathBuf,
}

impl StagingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn discovered_path(&self) -> PathBuf {
        self.dir.join(DISCOVERED_FILE)
    }

    pub fn enriched_path(&self) -> PathBuf {
        self.dir.join(ENRICHED_FILE)
    }

    pub fn assessed_path(&self) -> PathBuf {
        self.dir.join(ASSESSED_FILE)
    }

    pub fn reviewed_path(&self) -> PathBuf {
        self.dir.join(REVIEWED_FILE)
    }

    /// Load discovered items, or an error naming the discover stage.
    pub fn require_discovered(&self) -> Result<Vec<DiscoveredItem>> {
        load_array(&self.discovered_path())?
            .ok_or_else(|| Error::missing_stage("discovery", &self.discovered_path(), "discover"))
    }

    /// Load enriched items, or an error naming the enrich stage.
    pub fn require_enriched(&self) -> Result<Vec<EnrichedItem>> {
        load_array(&self.enriched_path())?
            .ok_or_else(|| Error::missing_stage("enrichment", &self.enriched_path(), "enrich"))
    }

    /// Load assessed items, or an error naming the assess stage.
    pub fn require_assessed(&self) -> Result<Vec<AssessedItem>> {
        load_array(&self.assessed_path())?
            .ok_or_else(|| Error::missing_stage("assessment", &self.assessed_path(), "assess"))
    }

    /// Load reviewed items, or an error naming the review stage.
    pub fn require_reviewed(&self) -> Result<Vec<ReviewedItem>> {
        load_array(&self.reviewed_path())?
            .ok_or_else(|| Error::missing_stage("review", &self.reviewed_path(), "review"))
    }

    /// Load assessed items from a prior run, empty when none exist yet.
    pub fn load_assessed_or_empty(&self) -> Result<Vec<AssessedItem>> {
        Ok(load_array(&self.assessed_path())?.unwrap_or_default())
    }

    /// Load reviewed items from a prior run, empty when none exist yet.
    pub fn load_reviewed_or_empty(&self) -> Result<Vec<ReviewedItem>> {
        Ok(load_array(&self.reviewed_path())?.unwrap_or_default())
    }

    pub fn save_discovered(&self, items: &[DiscoveredItem]) -> Result<()> {
        save_array(&self.discovered_path(), items)
    }

    pub fn save_enriched(&self, items: &[EnrichedItem]) -> Result<()> {
        save_array(&self.enriched_path(), items)
    }

    pub fn save_assessed(&self, items: &[AssessedItem]) -> Result<()> {
        save_array(&self.assessed_path(), items)
    }

    pub fn save_reviewed(&self, items: &[ReviewedItem]) -> Result<()> {
        save_array(&self.reviewed_path(), items)
    }

    /// Delete every intermediate stage file. Never touches the catalog.
    ///
    /// Returns how many files were removed.
    pub fn reset(&self) -> Result<usize> {
        let mut removed = 0;
        for path in [
            self.discovered_path(),
            self.enriched_path(),
            self.assessed_path(),
            self.reviewed_path(),
        ] {
            if path.exists() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Paths of staging files that currently exist on disk.
    pub fn existing_files(&self) -> Vec<PathBuf> {
        [
            self.discovered_path(),
            self.enriched_path(),
            self.assessed_path(),
            self.reviewed_path(),
        ]
        .into_iter()
        .filter(|p| p.exists())
        .collect()
    }
}

/// Load a JSON array file; `Ok(None)` when the file does not exist.
pub fn load_array<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let items = serde_json::from_str(&content)?;
    Ok(Some(items))
}

/// Write a pretty-printed JSON array atomically.
pub fn save_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(items)?;
    write_atomic(path, json.as_bytes())
}

/// Write bytes to `path` via a sibling temp file and rename.
///
/// The rename is the commit point: readers either see the old content or the
/// new content, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AiAssessment, AssessedItem, EnrichedItem, MediaKind, SafetyRating, StimulationLevel,
    };
    use tempfile::TempDir;

    fn enriched_item() -> EnrichedItem {
        EnrichedItem {
            tmdb_id: 7,
            media_type: MediaKind::Movie,
            title: "Luca".to_string(),
            synopsis: "Sea monsters on the Italian Riviera.".to_string(),
            cover_image_url: String::new(),
            imdb_id: Some("tt12801262".to_string()),
            release_year: Some("2021".to_string()),
            runtime: Some("1 hr 35 min".to_string()),
            cast: vec![],
            genres: vec!["Animation".into()],
            certification: Some("PG".to_string()),
            platforms: vec![],
            popularity: 50.0,
            vote_average: 7.8,
        }
    }

    #[test]
    fn missing_file_maps_to_stage_error() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path());

        let err = store.require_discovered().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("discovery"), "got: {}", msg);
        assert!(msg.contains("kidshelf discover"), "got: {}", msg);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path());

        let items = vec![enriched_item()];
        store.save_enriched(&items).unwrap();

        let loaded = store.require_enriched().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].imdb_id.as_deref(), Some("tt12801262"));

        // Pretty-printed on disk
        let raw = std::fs::read_to_string(store.enriched_path()).unwrap();
        assert!(raw.contains("\n  "));
    }

    #[test]
    fn reset_removes_stage_files_only() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path());

        store.save_enriched(&[enriched_item()]).unwrap();
        store
            .save_assessed(&[AssessedItem {
                enriched: enriched_item(),
                assessment: AiAssessment {
                    rating: SafetyRating::Safe,
                    min_age: 4.0,
                    max_age: 10.0,
                    stimulation_level: StimulationLevel::Medium,
                    has_lgbtq: false,
                    has_violence: false,
                    has_scary: false,
                    is_educational: false,
                    reasoning: "A warm coming-of-age story with mild peril only.".to_string(),
                    safe_above_age: None,
                    is_episodic_issue: false,
                },
                flagged_for_review: false,
            }])
            .unwrap();

        // A non-stage file in the same dir must survive reset.
        let catalog = dir.path().join("shows.json");
        std::fs::write(&catalog, "[]").unwrap();

        let removed = store.reset().unwrap();
        assert_eq!(removed, 2);
        assert!(catalog.exists());
        assert!(store.existing_files().is_empty());
    }
}
