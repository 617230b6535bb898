//! Derived view of the materialized list: filter, search, sort.
//!
//! Pure functions of their inputs: every call returns a fresh vector and
//! leaves the materialized list untouched. Recomputed on every render.

use std::cmp::Ordering;

use adega_shared::model::WineRecord;

use crate::state::{SortMode, TypeFilter};

/// Compute the filtered and sorted projection, in fixed step order:
/// type filter, then search, then sort.
pub fn project(
    wines: &[WineRecord],
    search: &str,
    filter: &TypeFilter,
    sort: SortMode,
) -> Vec<WineRecord> {
    let needle = search.trim().to_lowercase();

    let mut out: Vec<WineRecord> = wines
        .iter()
        .filter(|w| filter.matches(w.wine_type))
        .filter(|w| needle.is_empty() || matches_search(w, &needle))
        .cloned()
        .collect();

    match sort {
        // Already newest-first from the gateway.
        SortMode::Recent => {}
        // Stable sort: equal averages keep their newest-first order.
        SortMode::Rating => out.sort_by(|a, b| rating_key(b).total_cmp(&rating_key(a))),
        SortMode::Name => out.sort_by(|a, b| compare_names(&a.name, &b.name)),
    }

    out
}

/// Case-insensitive substring match over name, country, and region.
fn matches_search(wine: &WineRecord, needle: &str) -> bool {
    [
        Some(&wine.name),
        wine.country.as_ref(),
        wine.region.as_ref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Unrated wines sort as average 0.
fn rating_key(wine: &WineRecord) -> f64 {
    wine.average().unwrap_or(0.0)
}

/// Case-insensitive ordering, raw comparison as tiebreak.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
