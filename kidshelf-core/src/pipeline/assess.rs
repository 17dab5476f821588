//! Resumable assessment engine
//!
//! Exactly one [`AssessedItem`] per enriched item, with entries from prior
//! runs reused unchanged (keyed by [`EnrichedItem::resume_key`]). The output
//! is flushed after every new item so a killed run resumes with at most the
//! in-flight item lost. An optional cap bounds how many *new* assessments one
//! run performs; capped-out items stay pending for a future run.

use std::collections::HashSet;

use crate::error::Result;
use crate::safety::{SafetyClient, SafetyRequest};
use crate::types::{AssessedItem, EnrichedItem};

/// Outcome of one assessment run.
#[derive(Debug, Default)]
pub struct AssessmentReport {
    /// Items reused from a prior run
    pub reused: usize,
    /// Items newly assessed this run
    pub newly_assessed: usize,
    /// Per-item failures (title, error); these stay pending
    pub failed: Vec<(String, String)>,
    /// Pending items beyond the batch cap
    pub deferred_by_cap: usize,
    /// Total items flagged for mandatory human review
    pub flagged_total: usize,
}

impl AssessmentReport {
    /// Items still pending after this run (failures plus capped-out items).
    pub fn remaining_pending(&self) -> usize {
        self.failed.len() + self.deferred_by_cap
    }
}

/// Build the prompt input for one enriched item.
pub fn safety_request(item: &EnrichedItem) -> SafetyRequest {
    SafetyRequest {
        title: item.title.clone(),
        year: item.release_year.clone().unwrap_or_default(),
        synopsis: item.synopsis.clone(),
        genres: item.genres.clone(),
        certification: item.certification.clone(),
    }
}

/// Run assessments over `enriched`, merging into `existing` from prior runs.
///
/// `batch_limit` caps new assessments (0 = unlimited). `flush` is called with
/// the full output after every new item; its error aborts the run (the last
/// flushed state is still on disk, so a rerun resumes cleanly).
pub fn run_assessments(
    enriched: &[EnrichedItem],
    existing: Vec<AssessedItem>,
    client: &dyn SafetyClient,
    batch_limit: usize,
    mut flush: impl FnMut(&[AssessedItem]) -> Result<()>,
    mut on_item: impl FnMut(usize, usize, &str),
) -> Result<(Vec<AssessedItem>, AssessmentReport)> {
    let mut assessed = existing;
    let mut report = AssessmentReport::default();

    let mut keys: HashSet<String> = assessed.iter().map(|a| a.enriched.resume_key()).collect();
    report.flagged_total = assessed.iter().filter(|a| a.flagged_for_review).count();

    let pending: Vec<&EnrichedItem> = enriched
        .iter()
        .filter(|item| !keys.contains(&item.resume_key()))
        .collect();
    report.reused = enriched.len() - pending.len();

    let (batch, deferred) = if batch_limit > 0 && pending.len() > batch_limit {
        pending.split_at(batch_limit)
    } else {
        (&pending[..], &[][..])
    };
    report.deferred_by_cap = deferred.len();

    for (index, item) in batch.iter().enumerate() {
        on_item(index, batch.len(), &item.title);

        match client.assess(&safety_request(item)) {
            Ok(assessment) => {
                let flagged = assessment.needs_review();
                if flagged {
                    report.flagged_total += 1;
                }
                keys.insert(item.resume_key());
                assessed.push(AssessedItem {
                    enriched: (*item).clone(),
                    assessment,
                    flagged_for_review: flagged,
                });
                report.newly_assessed += 1;
                flush(&assessed)?;
            }
            Err(e) => {
                // Item failure only; the batch continues.
                tracing::warn!(title = %item.title, error = %e, "assessment failed, skipping item");
                report.failed.push((item.title.clone(), e.to_string()));
            }
        }
    }

    Ok((assessed, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{AiAssessment, MediaKind, SafetyRating, StimulationLevel};
    use std::cell::RefCell;

    fn enriched(tmdb_id: u64, imdb: &str) -> EnrichedItem {
        EnrichedItem {
            tmdb_id,
            media_type: MediaKind::Tv,
            title: format!("Show {}", tmdb_id),
            synopsis: "Synopsis.".to_string(),
            cover_image_url: String::new(),
            imdb_id: Some(imdb.to_string()),
            release_year: Some("2020".to_string()),
            runtime: None,
            cast: vec![],
            genres: vec!["Animation".into()],
            certification: None,
            platforms: vec![],
            popularity: 1.0,
            vote_average: 7.0,
        }
    }

    fn safe_verdict() -> AiAssessment {
        AiAssessment {
            rating: SafetyRating::Safe,
            min_age: 3.0,
            max_age: 8.0,
            stimulation_level: StimulationLevel::Low,
            has_lgbtq: false,
            has_violence: false,
            has_scary: false,
            is_educational: false,
            reasoning: "Calm, friendly stories with nothing of concern throughout.".to_string(),
            safe_above_age: None,
            is_episodic_issue: false,
        }
    }

    /// Counts calls; optionally fails for specific titles.
    struct MockSafety {
        calls: RefCell<usize>,
        fail_titles: Vec<String>,
    }

    impl MockSafety {
        fn new() -> Self {
            Self {
                calls: RefCell::new(0),
                fail_titles: vec![],
            }
        }

        fn failing_on(titles: &[&str]) -> Self {
            Self {
                calls: RefCell::new(0),
                fail_titles: titles.iter().map(|t| t.to_string()).collect(),
            }
        }
    }

    impl SafetyClient for MockSafety {
        fn assess(&self, request: &SafetyRequest) -> crate::error::Result<AiAssessment> {
            *self.calls.borrow_mut() += 1;
            if self.fail_titles.contains(&request.title) {
                return Err(Error::Assessment("simulated failure".to_string()));
            }
            Ok(safe_verdict())
        }
    }

    fn no_flush(_: &[AssessedItem]) -> crate::error::Result<()> {
        Ok(())
    }

    #[test]
    fn batch_cap_enforced() {
        // 10 pending with a cap of 3 -> exactly 3 new, 7 pending after.
        let items: Vec<EnrichedItem> = (1..=10).map(|i| enriched(i, &format!("tt{}", i))).collect();
        let client = MockSafety::new();

        let (assessed, report) =
            run_assessments(&items, vec![], &client, 3, no_flush, |_, _, _| {}).unwrap();

        assert_eq!(assessed.len(), 3);
        assert_eq!(report.newly_assessed, 3);
        assert_eq!(report.deferred_by_cap, 7);
        assert_eq!(report.remaining_pending(), 7);
        assert_eq!(*client.calls.borrow(), 3);
    }

    #[test]
    fn resume_is_idempotent() {
        let items: Vec<EnrichedItem> = (1..=4).map(|i| enriched(i, &format!("tt{}", i))).collect();
        let client = MockSafety::new();

        let (first, _) =
            run_assessments(&items, vec![], &client, 0, no_flush, |_, _, _| {}).unwrap();
        let first_keys: Vec<String> = first.iter().map(|a| a.enriched.resume_key()).collect();

        let (second, report) =
            run_assessments(&items, first.clone(), &client, 0, no_flush, |_, _, _| {}).unwrap();
        let second_keys: Vec<String> = second.iter().map(|a| a.enriched.resume_key()).collect();

        assert_eq!(report.newly_assessed, 0);
        assert_eq!(report.reused, 4);
        assert_eq!(first_keys, second_keys);
        assert_eq!(*client.calls.borrow(), 4); // no re-querying on the second run
    }

    #[test]
    fn no_duplicate_resume_keys() {
        let items: Vec<EnrichedItem> = (1..=5).map(|i| enriched(i, &format!("tt{}", i))).collect();
        let client = MockSafety::new();

        let (partial, _) =
            run_assessments(&items[..3], vec![], &client, 0, no_flush, |_, _, _| {}).unwrap();
        let (full, _) =
            run_assessments(&items, partial, &client, 0, no_flush, |_, _, _| {}).unwrap();

        let keys: Vec<String> = full.iter().map(|a| a.enriched.resume_key()).collect();
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(full.len(), 5);
    }

    #[test]
    fn item_failure_does_not_abort_batch() {
        let items: Vec<EnrichedItem> = (1..=3).map(|i| enriched(i, &format!("tt{}", i))).collect();
        let client = MockSafety::failing_on(&["Show 2"]);

        let (assessed, report) =
            run_assessments(&items, vec![], &client, 0, no_flush, |_, _, _| {}).unwrap();

        assert_eq!(assessed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Show 2");
        // The failed item stays pending for a rerun.
        assert_eq!(report.remaining_pending(), 1);
    }

    #[test]
    fn flushes_after_every_new_item() {
        let items: Vec<EnrichedItem> = (1..=3).map(|i| enriched(i, &format!("tt{}", i))).collect();
        let client = MockSafety::new();
        let flush_sizes = RefCell::new(Vec::new());

        run_assessments(
            &items,
            vec![],
            &client,
            0,
            |assessed| {
                flush_sizes.borrow_mut().push(assessed.len());
                Ok(())
            },
            |_, _, _| {},
        )
        .unwrap();

        assert_eq!(*flush_sizes.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn flags_follow_needs_review() {
        struct CautionClient;
        impl SafetyClient for CautionClient {
            fn assess(&self, _: &SafetyRequest) -> crate::error::Result<AiAssessment> {
                let mut v = safe_verdict();
                v.rating = SafetyRating::Caution;
                Ok(v)
            }
        }

        let items = vec![enriched(1, "tt1")];
        let (assessed, report) =
            run_assessments(&items, vec![], &CautionClient, 0, no_flush, |_, _, _| {}).unwrap();
        assert!(assessed[0].flagged_for_review);
        assert_eq!(report.flagged_total, 1);
    }
}
