//! Cyclic prev/next navigation over option lists

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::derive_options;
use crate::lang::Language;
use crate::state::{Facet, FilterState};
use crate::store::RecordStore;

/// Intervals offered by the periodicity filter
pub const BIENNIAL_INTERVALS: RangeInclusive<u32> = 2..=20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

/// Neighbour of `current` among the non-empty `options`, wrapping both ways
///
/// An absent `current` counts as index -1. Empty options return `current`.
pub fn cycle<S: AsRef<str>>(options: &[S], current: &str, direction: Direction) -> String {
    let values: Vec<&str> = options
        .iter()
        .map(AsRef::as_ref)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return current.to_string();
    }
    let len = values.len() as isize;
    let index = values
        .iter()
        .position(|v| *v == current)
        .map_or(-1, |i| i as isize);
    let step = match direction {
        Direction::Prev => -1,
        Direction::Next => 1,
    };
    values[(index + step).rem_euclid(len) as usize].to_string()
}

/// Move a facet selection to its neighbour
///
/// Options are recomputed with the facet cleared first, so the cycle covers
/// every value reachable under the other filters. With no options left the
/// state is returned unchanged, keeping the current selection.
pub fn cycle_facet(
    store: &RecordStore,
    state: &FilterState,
    facet: Facet,
    direction: Direction,
    lang: Language,
) -> FilterState {
    let mut next = state.without_facet(facet);
    let options = derive_options(store, &next, lang);
    let values = options.values(facet);
    if values.is_empty() {
        debug!(facet = %facet, "No options to cycle through");
        return state.clone();
    }
    let selected = cycle(&values, state.facets.get(facet), direction);
    debug!(facet = %facet, from = state.facets.get(facet), to = %selected, "Cycled facet");
    next.facets.set(facet, selected);
    next
}

/// Candidate target years: every year between the store's first and last collection year
pub fn biennial_year_options(store: &RecordStore) -> Vec<i32> {
    let years = store.records().iter().filter_map(|r| r.collection_year);
    let (min, max) = years.fold((i32::MAX, i32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if min > max {
        return Vec::new();
    }
    (min..=max).collect()
}

pub fn biennial_interval_options() -> Vec<u32> {
    BIENNIAL_INTERVALS.collect()
}

pub fn cycle_biennial_target(
    store: &RecordStore,
    state: &FilterState,
    direction: Direction,
) -> FilterState {
    let options: Vec<String> = biennial_year_options(store)
        .into_iter()
        .map(|y| y.to_string())
        .collect();
    let current = state
        .biennial
        .target_year
        .map(|y| y.to_string())
        .unwrap_or_default();
    let mut next = state.clone();
    next.biennial.target_year = cycle(&options, &current, direction).parse().ok();
    next
}

pub fn cycle_biennial_interval(state: &FilterState, direction: Direction) -> FilterState {
    let options: Vec<String> = BIENNIAL_INTERVALS.map(|i| i.to_string()).collect();
    let current = state
        .biennial
        .interval
        .map(|i| i.to_string())
        .unwrap_or_default();
    let mut next = state.clone();
    next.biennial.interval = cycle(&options, &current, direction).parse().ok();
    next
}
