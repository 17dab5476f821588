//! Review decision engine
//!
//! Interactive and automated review share the same gate: an assessed item is
//! pending while no reviewed record exists for its provider id. Running
//! either mode twice never produces two records for the same id.
//!
//! A decision is an explicit three-way result rather than a sentinel value:
//! approved items carry the final record, rejected items produce nothing,
//! deferred items stay pending for a future run.

use chrono::{DateTime, Utc};

use crate::types::{AiAssessment, AssessedItem, ReviewedItem, SafetyRating, StimulationLevel};

/// All-ages AI output (max_age 99) clamps to this in automated mode: the
/// catalog's age range means "still interesting at", not "appropriate until".
const AUTO_MAX_AGE_CLAMP: f64 = 18.0;

/// Outcome of reviewing one item.
#[derive(Debug)]
pub enum ReviewDecision {
    /// Operator (or policy) approved; record goes to the reviewed file
    Approved(ReviewedItem),
    /// Item produces no record and will not be offered again this run
    Rejected,
    /// Item stays pending for a future run
    Deferred,
}

/// Operator-editable fields for one review.
///
/// Defaults mirror the AI suggestion; the interactive editor overrides
/// whichever the operator changes.
#[derive(Debug, Clone)]
pub struct ReviewForm {
    pub rating: SafetyRating,
    pub tags: Vec<String>,
    pub reasoning: String,
    pub min_age: f64,
    pub max_age: f64,
    pub stimulation_level: StimulationLevel,
    pub featured: bool,
}

impl ReviewForm {
    /// Pre-fill from the AI verdict (the Accept path uses this verbatim).
    pub fn from_assessment(assessment: &AiAssessment) -> Self {
        Self {
            rating: assessment.rating,
            tags: assessment.suggested_tags(),
            reasoning: assessment.reasoning.clone(),
            min_age: assessment.min_age,
            max_age: assessment.max_age,
            stimulation_level: assessment.stimulation_level,
            featured: false,
        }
    }
}

/// Assessed items with no reviewed record yet, in assessment order.
pub fn pending_items(assessed: &[AssessedItem], reviewed: &[ReviewedItem]) -> Vec<AssessedItem> {
    let reviewed_ids: std::collections::HashSet<u64> =
        reviewed.iter().map(|r| r.enriched.tmdb_id).collect();
    assessed
        .iter()
        .filter(|item| !reviewed_ids.contains(&item.enriched.tmdb_id))
        .cloned()
        .collect()
}

/// Build the final record from a (possibly edited) form.
///
/// `safe_above_age` and `is_episodic_issue` always come from the AI verdict;
/// the original verdict is kept alongside for audit.
pub fn approve(item: &AssessedItem, form: ReviewForm, reviewed_at: DateTime<Utc>) -> ReviewedItem {
    ReviewedItem {
        enriched: item.enriched.clone(),
        rating: form.rating,
        tags: form.tags,
        reasoning: form.reasoning,
        min_age: form.min_age,
        max_age: form.max_age,
        stimulation_level: form.stimulation_level,
        featured: form.featured,
        safe_above_age: item.assessment.safe_above_age,
        is_episodic_issue: item.assessment.is_episodic_issue,
        ai_suggestion: Some(item.assessment.clone()),
        reviewed_at,
    }
}

/// Automated acceptance of one item: AI fields verbatim except the all-ages
/// clamp; never featured.
pub fn auto_approve(item: &AssessedItem, reviewed_at: DateTime<Utc>) -> ReviewedItem {
    let mut form = ReviewForm::from_assessment(&item.assessment);
    if form.max_age >= 99.0 {
        form.max_age = AUTO_MAX_AGE_CLAMP;
    }
    approve(item, form, reviewed_at)
}

/// Automated review over the whole pending set.
///
/// Returns the newly approved records (the caller appends them to the
/// reviewed file).
pub fn auto_review(
    assessed: &[AssessedItem],
    reviewed: &[ReviewedItem],
    reviewed_at: DateTime<Utc>,
) -> Vec<ReviewedItem> {
    pending_items(assessed, reviewed)
        .iter()
        .map(|item| auto_approve(item, reviewed_at))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnrichedItem, MediaKind};

    fn assessed(tmdb_id: u64, max_age: f64) -> AssessedItem {
        AssessedItem {
            enriched: EnrichedItem {
                tmdb_id,
                media_type: MediaKind::Tv,
                title: format!("Show {}", tmdb_id),
                synopsis: String::new(),
                cover_image_url: String::new(),
                imdb_id: Some(format!("tt{}", tmdb_id)),
                release_year: None,
                runtime: None,
                cast: vec![],
                genres: vec![],
                certification: None,
                platforms: vec![],
                popularity: 0.0,
                vote_average: 0.0,
            },
            assessment: AiAssessment {
                rating: SafetyRating::Safe,
                min_age: 3.0,
                max_age,
                stimulation_level: StimulationLevel::Medium,
                has_lgbtq: false,
                has_violence: true,
                has_scary: false,
                is_educational: true,
                reasoning: "Mild slapstick only; broadly suitable for young viewers.".to_string(),
                safe_above_age: Some(5.0),
                is_episodic_issue: true,
            },
            flagged_for_review: false,
        }
    }

    #[test]
    fn auto_clamps_all_ages_to_eighteen() {
        // An all-ages verdict (99) records as 18; anything below passes through.
        let now = Utc::now();
        let clamped = auto_approve(&assessed(1, 99.0), now);
        assert_eq!(clamped.max_age, 18.0);

        let clamped_above = auto_approve(&assessed(2, 120.0), now);
        assert_eq!(clamped_above.max_age, 18.0);

        let untouched = auto_approve(&assessed(3, 12.0), now);
        assert_eq!(untouched.max_age, 12.0);
    }

    #[test]
    fn auto_review_is_never_featured_and_keeps_ai_fields() {
        let now = Utc::now();
        let record = auto_approve(&assessed(1, 10.0), now);
        assert!(!record.featured);
        assert_eq!(record.rating, SafetyRating::Safe);
        assert_eq!(record.tags, vec!["Educational", "Violence"]);
        assert_eq!(record.safe_above_age, Some(5.0));
        assert!(record.is_episodic_issue);
        assert!(record.ai_suggestion.is_some());
    }

    #[test]
    fn pending_filter_is_the_sole_gate() {
        let now = Utc::now();
        let all = vec![assessed(1, 10.0), assessed(2, 10.0), assessed(3, 10.0)];

        let first = auto_review(&all, &[], now);
        assert_eq!(first.len(), 3);

        // Second run with the first run's output appended: nothing new.
        let second = auto_review(&all, &first, now);
        assert!(second.is_empty());
    }

    #[test]
    fn partial_review_leaves_rest_pending() {
        let now = Utc::now();
        let all = vec![assessed(1, 10.0), assessed(2, 10.0)];
        let reviewed = vec![auto_approve(&all[0], now)];

        let pending = pending_items(&all, &reviewed);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].enriched.tmdb_id, 2);
    }

    #[test]
    fn form_defaults_mirror_assessment() {
        let item = assessed(1, 9.0);
        let form = ReviewForm::from_assessment(&item.assessment);
        assert_eq!(form.rating, item.assessment.rating);
        assert_eq!(form.min_age, 3.0);
        assert_eq!(form.max_age, 9.0);
        assert!(!form.featured);
    }
}
