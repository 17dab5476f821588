//! Catalog maintenance: re-run the safety check on previously rejected shows
//!
//! Model guidance evolves; a show rated Unsafe under an old rubric may be
//! fine under the current one. This pass patches only the safety-derived
//! fields of matching records, leaving curation (tags, ages, featured) alone.
//!
//! The catalog stores tags, not the provider's genre list, so the prompt for
//! a reassessment rebuilds an approximate genre list from the tags. That
//! reconstruction is lossy and intentional.

use crate::catalog::Catalog;
use crate::safety::{SafetyClient, SafetyRequest};
use crate::types::{SafetyRating, ShowRecord};

/// Whether a catalog record is due for another look.
pub fn needs_reassessment(show: &ShowRecord) -> bool {
    show.rating == SafetyRating::Unsafe
}

/// Approximate the provider genre list from catalog tags.
///
/// Only three tags map back; anything else is dropped. Output order is fixed
/// regardless of tag order.
pub fn genres_from_tags(tags: &[String]) -> Vec<String> {
    let mut genres = Vec::new();
    for (tag, genre) in [
        ("Educational", "Family"),
        ("Fantasy", "Fantasy"),
        ("Action", "Action"),
    ] {
        if tags.iter().any(|t| t == tag) {
            genres.push(genre.to_string());
        }
    }
    genres
}

fn request_for(show: &ShowRecord) -> SafetyRequest {
    SafetyRequest {
        title: show.title.clone(),
        year: show.release_year.clone().unwrap_or_default(),
        synopsis: show.synopsis.clone(),
        genres: genres_from_tags(&show.tags),
        certification: None,
    }
}

/// One record's reassessment result.
#[derive(Debug)]
pub struct RatingChange {
    pub title: String,
    pub old_rating: SafetyRating,
    pub new_rating: SafetyRating,
}

#[derive(Debug, Default)]
pub struct ReassessOutcome {
    pub examined: usize,
    pub changes: Vec<RatingChange>,
    pub unchanged: usize,
    pub failures: Vec<(String, String)>,
}

/// Reassess every due record in place.
///
/// Only the safety verdict fields are patched: rating, reasoning,
/// safe_above_age, is_episodic_issue. Per-record failures are collected and
/// the rest of the pass continues. The caller is responsible for backing up
/// and saving the catalog.
pub fn reassess_in_place(
    catalog: &mut Catalog,
    client: &dyn SafetyClient,
    mut on_item: impl FnMut(usize, usize, &str),
) -> ReassessOutcome {
    let due: Vec<usize> = (0..catalog.shows.len())
        .filter(|&i| needs_reassessment(&catalog.shows[i]))
        .collect();

    let mut outcome = ReassessOutcome {
        examined: due.len(),
        ..Default::default()
    };

    for (n, &i) in due.iter().enumerate() {
        on_item(n + 1, due.len(), &catalog.shows[i].title);

        let request = request_for(&catalog.shows[i]);
        let verdict = match client.assess(&request) {
            Ok(v) => v,
            Err(err) => {
                outcome
                    .failures
                    .push((catalog.shows[i].title.clone(), err.to_string()));
                continue;
            }
        };

        let show = &mut catalog.shows[i];
        let old_rating = show.rating;
        show.rating = verdict.rating;
        show.reasoning = verdict.reasoning;
        show.safe_above_age = verdict.safe_above_age;
        show.is_episodic_issue = verdict.is_episodic_issue;

        if old_rating != verdict.rating {
            outcome.changes.push(RatingChange {
                title: show.title.clone(),
                old_rating,
                new_rating: verdict.rating,
            });
        } else {
            outcome.unchanged += 1;
        }
    }

    outcome
}
