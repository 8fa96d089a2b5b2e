//! Filter engine
//!
//! Pure functions from a record store and a [`FilterState`] to the visible
//! record subset and the per-facet option lists. Nothing is cached: every call
//! recomputes from scratch.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lang::Language;
use crate::record::{PLACEHOLDER, Record};
use crate::state::{Facet, FacetSelections, FilterState};
use crate::store::{RecordStore, RegionTable};

/// Value a record exposes for a facet
pub fn facet_value(record: &Record, facet: Facet) -> Cow<'_, str> {
    match facet {
        Facet::Species => Cow::Owned(record.species_key()),
        Facet::Genus => Cow::Borrowed(&record.genus),
        Facet::Family => Cow::Borrowed(&record.family),
        Facet::Order => Cow::Borrowed(&record.order),
        Facet::Prefecture => Cow::Borrowed(record.prefecture.as_deref().unwrap_or(PLACEHOLDER)),
        Facet::Island => Cow::Borrowed(record.island.as_deref().unwrap_or(PLACEHOLDER)),
        Facet::Literature => {
            Cow::Borrowed(record.literature_id.as_deref().unwrap_or(PLACEHOLDER))
        }
    }
}

/// Whether a record survives every stage of the filter pipeline
pub fn passes(record: &Record, state: &FilterState) -> bool {
    // Exact-match facets
    if !state
        .facets
        .active()
        .all(|(facet, selected)| facet_value(record, facet) == selected)
    {
        return false;
    }

    // Record-type visibility; unknown types fail closed
    let Some(record_type) = record.record_type else {
        return false;
    };
    if !state.types.is_visible(record_type) {
        return false;
    }

    // Exclusions
    let ex = &state.exclusions;
    if (ex.undescribed && record.undescribed)
        || (ex.unranked && !record.taxon_rank.is_ranked())
        || (ex.unpublished && record.is_unpublished())
        || (ex.dubious && record_type.is_doubtful())
        || (ex.citation && !record.original)
    {
        return false;
    }

    // Year ranges; unparseable years drop out while a range is active
    for (range, year) in [
        (&state.publication_years, record.publication_year),
        (&state.collection_years, record.collection_year),
    ] {
        if range.enabled && !year.is_some_and(|y| range.contains(y)) {
            return false;
        }
    }

    if state.biennial.enabled {
        if let Some((target, interval)) = state.biennial.parameters() {
            let keep = record
                .collection_year
                .is_some_and(|y| crate::state::BiennialFilter::matches(target, interval, y));
            if !keep {
                return false;
            }
        }
    }

    if state.months.enabled
        && state.months.any_selected()
        && !record
            .collection_month
            .is_some_and(|m| state.months.is_selected(m))
    {
        return false;
    }

    if state.life_stages.enabled
        && state.life_stages.any_selected()
        && !state.life_stages.is_selected(record.life_stage)
    {
        return false;
    }

    true
}

/// Visible subset in store order
pub fn compute_visible<'a>(records: &'a [Record], state: &FilterState) -> Vec<&'a Record> {
    let visible: Vec<&Record> = records.iter().filter(|r| passes(r, state)).collect();
    debug!(total = records.len(), visible = visible.len(), "Computed visible records");
    visible
}

/// One selectable facet value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
    /// Kept only because it is the current selection
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub orphaned: bool,
}

impl FacetOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            orphaned: false,
        }
    }
}

/// Option lists for all seven facets
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOptions {
    pub species: Vec<FacetOption>,
    pub genus: Vec<FacetOption>,
    pub family: Vec<FacetOption>,
    pub order: Vec<FacetOption>,
    pub prefecture: Vec<FacetOption>,
    pub island: Vec<FacetOption>,
    pub literature: Vec<FacetOption>,
}

impl FacetOptions {
    pub fn get(&self, facet: Facet) -> &[FacetOption] {
        match facet {
            Facet::Species => &self.species,
            Facet::Genus => &self.genus,
            Facet::Family => &self.family,
            Facet::Order => &self.order,
            Facet::Prefecture => &self.prefecture,
            Facet::Island => &self.island,
            Facet::Literature => &self.literature,
        }
    }

    fn get_mut(&mut self, facet: Facet) -> &mut Vec<FacetOption> {
        match facet {
            Facet::Species => &mut self.species,
            Facet::Genus => &mut self.genus,
            Facet::Family => &mut self.family,
            Facet::Order => &mut self.order,
            Facet::Prefecture => &mut self.prefecture,
            Facet::Island => &mut self.island,
            Facet::Literature => &mut self.literature,
        }
    }

    /// Non-empty values of a facet, in option order
    pub fn values(&self, facet: Facet) -> Vec<&str> {
        self.get(facet)
            .iter()
            .map(|o| o.value.as_str())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn contains(&self, facet: Facet, value: &str) -> bool {
        self.get(facet).iter().any(|o| o.value == value)
    }

    /// Append each selection missing from its own option list
    pub fn preserve_selections(&mut self, selections: &FacetSelections) {
        for (facet, selected) in selections.active() {
            if !self.contains(facet, selected) {
                debug!(facet = %facet, value = selected, "Preserving orphaned selection");
                self.get_mut(facet).push(FacetOption {
                    value: selected.to_string(),
                    label: selected.to_string(),
                    orphaned: true,
                });
            }
        }
    }
}

/// Option lists derived from an already-filtered record set
pub fn compute_facet_options(
    store: &RecordStore,
    visible: &[&Record],
    lang: Language,
) -> FacetOptions {
    let species: BTreeSet<String> = visible.iter().map(|r| r.species_key()).collect();

    FacetOptions {
        species: species
            .into_iter()
            .map(|key| FacetOption::new(key.clone(), key))
            .collect(),
        genus: taxon_options(store, visible, Facet::Genus),
        family: taxon_options(store, visible, Facet::Family),
        order: taxon_options(store, visible, Facet::Order),
        prefecture: region_options(store.prefectures(), visible, Facet::Prefecture, lang),
        island: region_options(store.islands(), visible, Facet::Island, lang),
        literature: literature_options(store, visible, lang),
    }
}

/// Visible set, its facet options, and orphan preservation in one pass
pub fn derive_options(store: &RecordStore, state: &FilterState, lang: Language) -> FacetOptions {
    let visible = compute_visible(store.records(), state);
    let mut options = compute_facet_options(store, &visible, lang);
    options.preserve_selections(&state.facets);
    options
}

fn taxon_options(store: &RecordStore, visible: &[&Record], facet: Facet) -> Vec<FacetOption> {
    let mut seen = HashSet::new();
    let mut values: Vec<&str> = Vec::new();
    for record in visible {
        let value = match facet {
            Facet::Genus => record.genus.as_str(),
            Facet::Family => record.family.as_str(),
            _ => record.order.as_str(),
        };
        if seen.insert(value) {
            values.push(value);
        }
    }
    values.sort_by(|a, b| match (*a == PLACEHOLDER, *b == PLACEHOLDER) {
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        _ => a.cmp(b),
    });
    values
        .into_iter()
        .map(|v| {
            let label = format!("{} / {}", v, store.taxon_japanese_name(v));
            FacetOption::new(v, label)
        })
        .collect()
}

fn region_options(
    table: &RegionTable,
    visible: &[&Record],
    facet: Facet,
    lang: Language,
) -> Vec<FacetOption> {
    let present: HashSet<Cow<'_, str>> = visible.iter().map(|r| facet_value(r, facet)).collect();
    table
        .order()
        .filter(|name| present.contains(*name))
        .map(|name| FacetOption::new(name, table.label(name, lang)))
        .collect()
}

fn literature_options(
    store: &RecordStore,
    visible: &[&Record],
    lang: Language,
) -> Vec<FacetOption> {
    let present: HashSet<&str> = visible
        .iter()
        .filter_map(|r| r.literature_id.as_deref())
        .collect();
    store
        .literature()
        .iter()
        .filter(|entry| present.contains(entry.id.as_str()))
        .map(|entry| {
            FacetOption::new(
                entry.id.clone(),
                store.literature_option_label(&entry.id, lang),
            )
        })
        .collect()
}
