//! Filter/sort projection.
//!
//! A `FilterSortSpec` is a value object re-derived on every input change by
//! the boundary; applying it is pure and synchronous and never mutates the
//! stored list order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use clubdesk_infra::SortDirection;

use crate::kind::{RecordKind, SortField, SortKey};

/// Exact-match status filter, with a sentinel that bypasses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    Only(String),
}

impl StatusFilter {
    fn matches(&self, label: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == label,
        }
    }
}

/// The current view's filter and sort choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSortSpec {
    pub search_term: String,
    pub status_filter: StatusFilter,
    pub sort_field: SortField,
    pub direction: SortDirection,
}

impl Default for FilterSortSpec {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            status_filter: StatusFilter::All,
            sort_field: SortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

impl FilterSortSpec {
    pub fn searching(term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            ..Self::default()
        }
    }
}

/// Project `records` through `spec`.
///
/// Search matches case-insensitively against the kind's text fields; the
/// status filter is an exact label match; the sort is stable, so ties keep
/// the original list order in either direction.
pub fn apply_filter_sort<K: RecordKind>(
    records: &[K::Record],
    spec: &FilterSortSpec,
) -> Vec<K::Record> {
    let needle = spec.search_term.trim().to_lowercase();

    let mut rows: Vec<&K::Record> = records
        .iter()
        .filter(|r| spec.status_filter.matches(K::status_label(r)))
        .filter(|r| {
            needle.is_empty()
                || K::search_text(r)
                    .iter()
                    .any(|text| text.to_lowercase().contains(&needle))
        })
        .collect();

    rows.sort_by(|a, b| {
        let ordering = compare_keys(
            &K::sort_key(a, spec.sort_field),
            &K::sort_key(b, spec.sort_field),
        );
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    rows.into_iter().cloned().collect()
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Instant(x), SortKey::Instant(y)) => x.cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        // A kind projects one variant per field, so mixed keys tie.
        _ => Ordering::Equal,
    }
}
