//! Everything derived from one (store, state) pair
//!
//! [`derive_view`] is the single full recompute. Its result is published as a
//! whole, so consumers never observe a view built from two different states.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{
    MonthlyCounts, PrefectureChart, YearChart, monthly_counts, prefecture_chart, year_chart,
};
use crate::codec;
use crate::engine::{FacetOptions, compute_facet_options, compute_visible};
use crate::lang::Language;
use crate::markers::{DEFAULT_THINNING_RADIUS_PX, Marker, Viewport, thin_markers};
use crate::record::Record;
use crate::state::FilterState;
use crate::store::{RecordStore, YearBounds};
use crate::taxonomy::{TaxonomicList, build_taxonomic_list};

/// Map placement used for marker thinning
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    pub viewport: Viewport,
    pub thinning_radius_px: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            viewport: Viewport::from_center(36.68917, 139.8192, 8.5, 1280, 800),
            thinning_radius_px: DEFAULT_THINNING_RADIUS_PX,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInfo {
    pub record_count: usize,
    /// Distinct coordinate pairs; records without coordinates share one key
    pub location_count: usize,
}

impl RecordInfo {
    pub fn from_visible(visible: &[&Record]) -> Self {
        let locations: HashSet<(Option<u64>, Option<u64>)> = visible
            .iter()
            .map(|r| (r.latitude.map(f64::to_bits), r.longitude.map(f64::to_bits)))
            .collect();
        Self {
            record_count: visible.len(),
            location_count: locations.len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureListItem {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Literature cited by the visible records, in literature-table order
pub fn literature_list(store: &RecordStore, visible: &[&Record], lang: Language) -> Vec<LiteratureListItem> {
    let cited: HashSet<&str> = visible
        .iter()
        .filter_map(|r| r.literature_id.as_deref())
        .collect();
    store
        .literature()
        .iter()
        .filter(|entry| cited.contains(entry.id.as_str()))
        .map(|entry| LiteratureListItem {
            id: entry.id.clone(),
            label: entry.label(lang),
            link: entry.link.clone(),
        })
        .collect()
}

/// Complete derived state for one recompute
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedView {
    /// Encoded non-default state
    pub query: String,
    pub record_info: RecordInfo,
    pub year_bounds: YearBounds,
    pub options: FacetOptions,
    pub monthly: MonthlyCounts,
    pub prefecture_chart: PrefectureChart,
    pub year_chart: YearChart,
    pub literature: Vec<LiteratureListItem>,
    pub markers: Vec<Marker>,
    pub taxonomy: TaxonomicList,
}

pub fn derive_view(
    store: &RecordStore,
    state: &FilterState,
    lang: Language,
    map: &MapSettings,
) -> DerivedView {
    let visible = compute_visible(store.records(), state);
    let mut options = compute_facet_options(store, &visible, lang);
    options.preserve_selections(&state.facets);

    let display = &state.display;
    let view = DerivedView {
        query: codec::encode(state),
        record_info: RecordInfo::from_visible(&visible),
        year_bounds: store.year_bounds(),
        options,
        monthly: monthly_counts(&visible),
        prefecture_chart: prefecture_chart(
            store,
            &visible,
            display.classification,
            display.chart_mode,
            state.exclusions.undescribed,
            lang,
        ),
        year_chart: year_chart(&visible, display.year_axis, display.year_count),
        literature: literature_list(store, &visible, lang),
        markers: thin_markers(&visible, &map.viewport, map.thinning_radius_px),
        taxonomy: build_taxonomic_list(store, &visible, state.show_higher_taxonomy),
    };
    debug!(
        records = view.record_info.record_count,
        locations = view.record_info.location_count,
        markers = view.markers.len(),
        "Derived view"
    );
    view
}
