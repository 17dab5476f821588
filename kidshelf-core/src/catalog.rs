//! The persisted show catalog
//!
//! A JSON array of [`ShowRecord`]s. The IMDb id is the stable primary key;
//! legacy entries added by hand before the pipeline existed may lack one and
//! are matched by normalized title instead.

use crate::error::{Error, Result};
use crate::store::{load_array, save_array};
use crate::types::ShowRecord;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Normalize a title for dedup matching: casefold, strip everything that is
/// not ASCII alphanumeric. "Bluey!" and "bluey" collapse to the same key.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// In-memory catalog with its backing file path.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    pub shows: Vec<ShowRecord>,
}

impl Catalog {
    /// Load the catalog; a missing file is an empty catalog.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let shows = load_array(&path)?.unwrap_or_default();
        Ok(Self { path, shows })
    }

    /// Load the catalog, erroring when the file does not exist.
    ///
    /// Reassessment patches the live file in place, so running it against a
    /// catalog that was never created is always a mistake.
    pub fn load_required(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match load_array(&path)? {
            Some(shows) => Ok(Self { path, shows }),
            None => Err(Error::Config(format!(
                "catalog file not found: {}",
                path.display()
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    /// Atomically rewrite the whole catalog file.
    pub fn save(&self) -> Result<()> {
        save_array(&self.path, &self.shows)
    }

    /// Write a timestamped backup next to the catalog, returning its path.
    ///
    /// `shows.json` -> `shows_backup_20260830_141530.json`
    pub fn write_backup(&self) -> Result<PathBuf> {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("catalog");
        let backup_name = format!("{}_backup_{}.json", stem, stamp);
        let backup_path = self
            .path
            .parent()
            .map(|p| p.join(&backup_name))
            .unwrap_or_else(|| PathBuf::from(&backup_name));
        save_array(&backup_path, &self.shows)?;
        Ok(backup_path)
    }

    /// Provider ids already present in the catalog.
    pub fn known_tmdb_ids(&self) -> HashSet<u64> {
        self.shows
            .iter()
            .filter_map(|s| s.tmdb_id.as_deref())
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    /// Normalized titles of entries lacking an external id.
    ///
    /// Rediscovering one of these is an upgrade of a manually-entered record,
    /// not a duplicate.
    pub fn legacy_titles(&self) -> HashSet<String> {
        self.shows
            .iter()
            .filter(|s| s.id.as_deref().map_or(true, str::is_empty))
            .map(|s| normalize_title(&s.title))
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Index of IMDb id -> position.
    pub fn id_index(&self) -> HashMap<String, usize> {
        let mut index = HashMap::new();
        for (i, show) in self.shows.iter().enumerate() {
            if let Some(id) = show.id.as_deref() {
                if !id.is_empty() {
                    index.insert(id.to_string(), i);
                }
            }
        }
        index
    }

    /// Index of normalized title -> positions (a key can be ambiguous).
    pub fn title_index(&self) -> HashMap<String, Vec<usize>> {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, show) in self.shows.iter().enumerate() {
            let key = normalize_title(&show.title);
            if !key.is_empty() {
                index.entry(key).or_default().push(i);
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SafetyRating;
    use tempfile::TempDir;

    pub(crate) fn show(id: Option<&str>, tmdb_id: Option<&str>, title: &str) -> ShowRecord {
        ShowRecord {
            id: id.map(String::from),
            tmdb_id: tmdb_id.map(String::from),
            title: title.to_string(),
            synopsis: String::new(),
            cover_image: String::new(),
            cast: vec![],
            tags: vec![],
            platforms: vec![],
            rating: SafetyRating::Safe,
            reasoning: String::new(),
            age_recommendation: "3+".to_string(),
            min_age: 3.0,
            max_age: 99.0,
            safe_above_age: None,
            is_episodic_issue: false,
            release_year: None,
            runtime: None,
            stimulation_level: None,
            featured: false,
        }
    }

    #[test]
    fn normalize_title_strips_punctuation_and_case() {
        assert_eq!(normalize_title("Bluey!"), "bluey");
        assert_eq!(normalize_title("  Hilda & Twig "), "hildatwig");
        assert_eq!(normalize_title("PAW Patrol"), "pawpatrol");
        assert_eq!(normalize_title("!!!"), "");
    }

    #[test]
    fn missing_catalog_loads_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::load(dir.path().join("shows.json")).unwrap();
        assert!(catalog.is_empty());
        assert!(Catalog::load_required(dir.path().join("shows.json")).is_err());
    }

    #[test]
    fn indexes_and_legacy_titles() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::load(dir.path().join("shows.json")).unwrap();
        catalog.shows = vec![
            show(Some("tt1"), Some("100"), "Bluey"),
            show(None, None, "Old Hand-Entered Show"),
            show(Some("tt2"), Some("200"), "Max"),
            show(Some("tt3"), Some("300"), "Max"),
        ];

        assert_eq!(catalog.known_tmdb_ids(), [100, 200, 300].into());
        assert_eq!(catalog.legacy_titles(), ["oldhandenteredshow".to_string()].into());

        let ids = catalog.id_index();
        assert_eq!(ids["tt1"], 0);

        let titles = catalog.title_index();
        assert_eq!(titles["bluey"], vec![0]);
        assert_eq!(titles["max"], vec![2, 3]);
    }

    #[test]
    fn save_and_backup() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::load(dir.path().join("shows.json")).unwrap();
        catalog.shows.push(show(Some("tt1"), Some("100"), "Bluey"));
        catalog.save().unwrap();

        let reloaded = Catalog::load_required(dir.path().join("shows.json")).unwrap();
        assert_eq!(reloaded.len(), 1);

        let backup = reloaded.write_backup().unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("shows_backup_"), "got: {}", name);
        assert!(backup.exists());
    }
}
