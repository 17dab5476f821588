//! Core domain types for kidshelf
//!
//! These are the value records passed between pipeline stages. Their serde
//! field names form the on-disk contract: stage files are JSON arrays of
//! these records, and resumability depends on the names staying stable.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **DiscoveredItem** | Candidate title found by paged search (stage 1 output) |
//! | **EnrichedItem** | Full metadata for a candidate (stage 2 output) |
//! | **AiAssessment** | AI safety verdict for one item |
//! | **AssessedItem** | Enriched item plus its verdict (stage 3 output, resumable) |
//! | **ReviewedItem** | Approved final record with audit trail (stage 4 output) |
//! | **ShowRecord** | Persisted catalog entry (camelCase, consumed externally) |
//!
//! Stage files use snake_case; the catalog uses camelCase because external
//! tooling reads it. `ShowRecord.id` (the IMDb id) is the stable primary key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::age_recommendation;

// ============================================
// Enums
// ============================================

/// TV show or movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Tv,
    Movie,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Tv => "tv",
            MediaKind::Movie => "movie",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tv" => Ok(MediaKind::Tv),
            "movie" => Ok(MediaKind::Movie),
            _ => Err(format!("unknown media kind: {}", s)),
        }
    }
}

/// Overall safety verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyRating {
    Safe,
    Caution,
    Unsafe,
}

impl SafetyRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyRating::Safe => "Safe",
            SafetyRating::Caution => "Caution",
            SafetyRating::Unsafe => "Unsafe",
        }
    }
}

impl std::str::FromStr for SafetyRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Safe" => Ok(SafetyRating::Safe),
            "Caution" => Ok(SafetyRating::Caution),
            "Unsafe" => Ok(SafetyRating::Unsafe),
            _ => Err(format!("unknown safety rating: {}", s)),
        }
    }
}

/// Pacing/energy level of the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StimulationLevel {
    Low,
    Medium,
    High,
}

impl StimulationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StimulationLevel::Low => "Low",
            StimulationLevel::Medium => "Medium",
            StimulationLevel::High => "High",
        }
    }
}

impl std::str::FromStr for StimulationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(StimulationLevel::Low),
            "Medium" => Ok(StimulationLevel::Medium),
            "High" => Ok(StimulationLevel::High),
            _ => Err(format!("unknown stimulation level: {}", s)),
        }
    }
}

// ============================================
// Stage 1: Discovery
// ============================================

/// Raw discovery result from the metadata provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredItem {
    /// Provider's numeric id
    pub tmdb_id: u64,
    pub media_type: MediaKind,
    pub title: String,
    pub original_title: String,
    /// Synopsis preview
    pub overview: String,
    pub poster_path: Option<String>,
    /// First air date or release date
    pub release_date: Option<String>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub popularity: f64,
    pub genre_ids: Vec<u64>,
    /// True when this item matches a catalog entry that has no external id
    /// yet: rediscovery upgrades the manually-entered record.
    #[serde(default)]
    pub legacy_upgrade: bool,
}

// ============================================
// Stage 2: Enrichment
// ============================================

/// Full metadata from the provider's detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub tmdb_id: u64,
    pub media_type: MediaKind,

    pub title: String,
    /// Full overview
    pub synopsis: String,
    /// Full w500 URL
    pub cover_image_url: String,

    /// Cross-provider id, e.g. "tt12345678"; required past enrichment
    pub imdb_id: Option<String>,
    /// "2018–Present" or "2020–2023"
    pub release_year: Option<String>,
    /// "22 min" or "1 hr 30 min"
    pub runtime: Option<String>,
    /// Top 3 actors
    pub cast: Vec<String>,
    /// ["Animation", "Family"]
    pub genres: Vec<String>,
    /// "TV-Y", "G", "PG"
    pub certification: Option<String>,
    /// ["Netflix", "Disney+", "Hulu"]
    pub platforms: Vec<String>,

    pub popularity: f64,
    pub vote_average: f64,
}

impl EnrichedItem {
    /// Stable key for assessment resume logic.
    ///
    /// IMDb id when present, else `"{media_type}:{tmdb_id}"`. Must stay
    /// collision-free within a catalog and stable across runs.
    pub fn resume_key(&self) -> String {
        match &self.imdb_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("{}:{}", self.media_type.as_str(), self.tmdb_id),
        }
    }
}

// ============================================
// Stage 3: AI assessment
// ============================================

/// AI safety verdict for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAssessment {
    pub rating: SafetyRating,
    /// Years; values below 1.0 encode months in tenths (0.5 = 5 months)
    pub min_age: f64,
    pub max_age: f64,
    pub stimulation_level: StimulationLevel,
    pub has_lgbtq: bool,
    pub has_violence: bool,
    pub has_scary: bool,
    pub is_educational: bool,
    pub reasoning: String,
    /// Age where a Caution verdict becomes Safe
    #[serde(default)]
    pub safe_above_age: Option<f64>,
    /// True when flags only apply to isolated episodes
    #[serde(default)]
    pub is_episodic_issue: bool,
}

impl AiAssessment {
    /// Whether this verdict requires mandatory human attention.
    ///
    /// Flags LGBTQ+ content, violence aimed below age 7, any non-Safe rating,
    /// and degenerate reasoning (under 50 characters signals a truncated or
    /// low-effort model response).
    pub fn needs_review(&self) -> bool {
        self.has_lgbtq
            || (self.has_violence && self.min_age < 7.0)
            || matches!(self.rating, SafetyRating::Unsafe | SafetyRating::Caution)
            || self.reasoning.len() < 50
    }

    /// Tags derived mechanically from the content flags, in fixed order.
    pub fn suggested_tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if self.is_educational {
            tags.push("Educational".to_string());
        }
        if self.has_lgbtq {
            tags.push("LGBTQ+ Themes".to_string());
        }
        if self.has_violence {
            tags.push("Violence".to_string());
        }
        if self.has_scary {
            tags.push("Scary Imagery".to_string());
        }
        tags
    }
}

/// Enriched item plus its AI verdict (stage 3 output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessedItem {
    pub enriched: EnrichedItem,
    pub assessment: AiAssessment,
    pub flagged_for_review: bool,
}

// ============================================
// Stage 4: Review
// ============================================

/// Human/auto-approved final record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewedItem {
    pub enriched: EnrichedItem,

    pub rating: SafetyRating,
    pub tags: Vec<String>,
    pub reasoning: String,
    pub min_age: f64,
    pub max_age: f64,
    pub stimulation_level: StimulationLevel,
    pub featured: bool,
    #[serde(default)]
    pub safe_above_age: Option<f64>,
    #[serde(default)]
    pub is_episodic_issue: bool,

    /// Original AI verdict, kept for audit
    pub ai_suggestion: Option<AiAssessment>,
    /// RFC 3339 review timestamp
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewedItem {
    /// Convert to the final catalog schema.
    pub fn to_show_record(&self) -> ShowRecord {
        ShowRecord {
            id: self.enriched.imdb_id.clone(),
            tmdb_id: Some(self.enriched.tmdb_id.to_string()),
            title: self.enriched.title.clone(),
            synopsis: self.enriched.synopsis.clone(),
            cover_image: self.enriched.cover_image_url.clone(),
            cast: self.enriched.cast.clone(),
            tags: self.tags.clone(),
            platforms: self.enriched.platforms.clone(),
            rating: self.rating,
            reasoning: self.reasoning.clone(),
            age_recommendation: age_recommendation(self.min_age, self.max_age),
            min_age: self.min_age,
            max_age: self.max_age,
            safe_above_age: self.safe_above_age,
            is_episodic_issue: self.is_episodic_issue,
            release_year: self.enriched.release_year.clone(),
            runtime: self.enriched.runtime.clone(),
            stimulation_level: Some(self.stimulation_level),
            featured: self.featured,
        }
    }
}

// ============================================
// Catalog
// ============================================

/// Persisted public-facing catalog entry.
///
/// Serialized camelCase: this file is consumed outside the pipeline and its
/// field names are part of that contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRecord {
    /// IMDb id; stable primary key. Legacy entries added by hand may lack it.
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<String>,
    pub title: String,
    pub synopsis: String,
    pub cover_image: String,
    pub cast: Vec<String>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    pub rating: SafetyRating,
    pub reasoning: String,
    pub age_recommendation: String,
    pub min_age: f64,
    pub max_age: f64,
    #[serde(default)]
    pub safe_above_age: Option<f64>,
    #[serde(default)]
    pub is_episodic_issue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimulation_level: Option<StimulationLevel>,
    #[serde(default)]
    pub featured: bool,
}
