//! Coverage reconciliation.
//!
//! Saving a planning item never sends its coverages inline. Instead the
//! edited coverage list is diffed against the last known one and turned into
//! individual save and delete calls, which must all settle before the parent
//! item is written.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::models::{Coverage, Planning};

/// Coverage writes needed to move from the original list to the updated one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    /// New or changed coverages, with their back-reference set
    pub to_save: Vec<Coverage>,
    /// Coverages no longer present in the updated list
    pub to_delete: Vec<Coverage>,
}

/// A single backend call of a [`ReconciliationPlan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverageOp<'a> {
    Save(&'a Coverage),
    Delete(&'a Coverage),
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_save.is_empty() && self.to_delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_save.len() + self.to_delete.len()
    }

    /// Saves first, then deletes. All of them may run concurrently.
    pub fn operations(&self) -> impl Iterator<Item = CoverageOp<'_>> {
        self.to_save
            .iter()
            .map(CoverageOp::Save)
            .chain(self.to_delete.iter().map(CoverageOp::Delete))
    }
}

/// Diffs `updated` against `original`, the coverages of `original_item`.
///
/// Coverages are matched by ID. A coverage without an ID, or whose match is
/// not equal to it, is saved; an original coverage whose ID no longer
/// appears is deleted; anything else needs no write. Scheduled times are
/// compared as instants.
pub fn reconcile(
    updated: &[Coverage],
    original_item: &Planning,
    original: &[Coverage],
) -> ReconciliationPlan {
    let parent_id = original_item.id.as_deref();

    let to_save = updated
        .iter()
        .filter_map(|coverage| {
            let mut candidate = coverage.clone();
            if let Some(parent_id) = parent_id {
                candidate.planning_item = Some(parent_id.to_string());
            }

            let unchanged = candidate.id.as_ref().is_some_and(|id| {
                original
                    .iter()
                    .find(|existing| existing.id.as_ref() == Some(id))
                    .is_some_and(|existing| same_coverage(existing, &candidate))
            });
            (!unchanged).then_some(candidate)
        })
        .collect();

    let kept: HashSet<&str> = updated
        .iter()
        .filter_map(|coverage| coverage.id.as_deref())
        .collect();
    let to_delete = original
        .iter()
        .filter(|coverage| {
            coverage
                .id
                .as_deref()
                .is_some_and(|id| !kept.contains(id))
        })
        .cloned()
        .collect();

    ReconciliationPlan { to_save, to_delete }
}

/// Equality ignoring the back-reference, which older originals may lack,
/// and the backend's `_`-prefixed bookkeeping fields.
fn same_coverage(original: &Coverage, candidate: &Coverage) -> bool {
    original.id == candidate.id
        && original.etag == candidate.etag
        && original.news_coverage_status == candidate.news_coverage_status
        && original.planning == candidate.planning
        && same_fields(&original.extra, &candidate.extra)
}

fn same_fields(original: &Map<String, Value>, candidate: &Map<String, Value>) -> bool {
    let visible = |fields: &Map<String, Value>| -> Vec<(String, Value)> {
        fields
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    };
    visible(original) == visible(candidate)
}
