//! Catalog import and merge planning
//!
//! Importing is split into a pure planning pass and a mutation pass so the
//! CLI can show a preview before touching the catalog file. Match priority
//! per reviewed item:
//!
//! 1. IMDb id match: replace (or keep, without the overwrite flag)
//! 2. unique normalized-title match: replace, keeping legacy upgrades sane
//! 3. ambiguous title (several catalog rows share the key): skip, never guess
//! 4. no match: append

use std::collections::HashMap;

use crate::catalog::{normalize_title, Catalog};
use crate::types::{ReviewedItem, ShowRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Matched an existing record and overwrite was not requested
    ExistingKept,
    /// Several catalog rows share the normalized title; matching would guess
    AmbiguousTitle,
}

/// What the merge will do with one reviewed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Add,
    /// Replace the catalog row at this position
    Replace(usize),
    Skip(SkipReason),
}

/// One planned import row, for preview and for apply.
#[derive(Debug)]
pub struct ImportDecision {
    pub record: ShowRecord,
    pub action: ImportAction,
}

#[derive(Debug, Default)]
pub struct ImportPlan {
    pub decisions: Vec<ImportDecision>,
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
}

impl ImportPlan {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.replaced == 0
    }
}

/// Decide, without mutating, what importing `reviewed` into `catalog` does.
///
/// `overwrite_existing` controls whether an id or unique-title match replaces
/// the existing row; without it the existing row is kept and the item skipped.
pub fn plan_import(catalog: &Catalog, reviewed: &[ReviewedItem], overwrite_existing: bool) -> ImportPlan {
    let id_index = catalog.id_index();
    let title_index = catalog.title_index();

    let mut plan = ImportPlan::default();
    for item in reviewed {
        let record = item.to_show_record();
        let action = decide(&record, &id_index, &title_index, overwrite_existing);
        match action {
            ImportAction::Add => plan.added += 1,
            ImportAction::Replace(_) => plan.replaced += 1,
            ImportAction::Skip(_) => plan.skipped += 1,
        }
        plan.decisions.push(ImportDecision { record, action });
    }
    plan
}

fn decide(
    record: &ShowRecord,
    id_index: &HashMap<String, usize>,
    title_index: &HashMap<String, Vec<usize>>,
    overwrite_existing: bool,
) -> ImportAction {
    if let Some(id) = record.id.as_deref().filter(|id| !id.is_empty()) {
        if let Some(&pos) = id_index.get(id) {
            return if overwrite_existing {
                ImportAction::Replace(pos)
            } else {
                ImportAction::Skip(SkipReason::ExistingKept)
            };
        }
    }

    let key = normalize_title(&record.title);
    match title_index.get(&key).map(Vec::as_slice) {
        Some([pos]) => {
            if overwrite_existing {
                ImportAction::Replace(*pos)
            } else {
                ImportAction::Skip(SkipReason::ExistingKept)
            }
        }
        Some(_) => ImportAction::Skip(SkipReason::AmbiguousTitle),
        None => ImportAction::Add,
    }
}

/// Apply a plan to the catalog in memory. Replacements land at the matched
/// position; adds append in plan order. The caller saves afterwards.
pub fn apply_plan(catalog: &mut Catalog, plan: ImportPlan) {
    for decision in plan.decisions {
        match decision.action {
            ImportAction::Replace(pos) => catalog.shows[pos] = decision.record,
            ImportAction::Add => catalog.shows.push(decision.record),
            ImportAction::Skip(_) => {}
        }
    }
}
