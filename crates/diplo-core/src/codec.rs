//! Query-string codec for [`FilterState`]
//!
//! `encode` emits only fields that differ from the default state. `decode`
//! starts from the default state and overlays every recognized parameter;
//! a malformed value falls back to the default for that field alone.
//!
//! Presence of a year bound, a biennial value or a life-stage flag implies
//! that the corresponding filter is enabled. An explicit `filter*Active`
//! parameter overrides the inferred value.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::debug;

use crate::error::CodecError;
use crate::record::RecordType as T;
use crate::state::{
    ChartMode, Classification, Facet, FilterState, YearAxis, YearCountMode, YearRangeFilter,
};

/// Form-urlencoded component set: alphanumerics and `*-._` pass through
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b' ');

pub const PUBLICATION_YEAR_FROM: &str = "publicationYearFrom";
pub const PUBLICATION_YEAR_TO: &str = "publicationYearTo";
pub const COLLECTION_YEAR_FROM: &str = "collectionYearFrom";
pub const COLLECTION_YEAR_TO: &str = "collectionYearTo";
pub const BIENNIAL_TARGET_YEAR: &str = "biennialTargetYear";
pub const BIENNIAL_INTERVAL: &str = "biennialInterval";
pub const COLLECTION_MONTHS: &str = "collectionMonths";
pub const ADULT: &str = "adult";
pub const JUVENILE_UNKNOWN: &str = "juvenile_unknown";

struct BoolField {
    key: &'static str,
    get: fn(&FilterState) -> bool,
    set: fn(&mut FilterState, bool),
}

fn field(
    key: &'static str,
    get: fn(&FilterState) -> bool,
    set: fn(&mut FilterState, bool),
) -> BoolField {
    BoolField { key, get, set }
}

fn bool_fields() -> [BoolField; 19] {
    [
        field(
            "filterPublicationYearActive",
            |s| s.publication_years.enabled,
            |s, v| s.publication_years.enabled = v,
        ),
        field(
            "filterCollectionYearActive",
            |s| s.collection_years.enabled,
            |s, v| s.collection_years.enabled = v,
        ),
        field(
            "filterBiennialActive",
            |s| s.biennial.enabled,
            |s, v| s.biennial.enabled = v,
        ),
        field(
            "filterCollectionMonthActive",
            |s| s.months.enabled,
            |s, v| s.months.enabled = v,
        ),
        field(
            "filterLifeStageActive",
            |s| s.life_stages.enabled,
            |s, v| s.life_stages.enabled = v,
        ),
        field(
            "excludeUnpublished",
            |s| s.exclusions.unpublished,
            |s, v| s.exclusions.unpublished = v,
        ),
        field(
            "excludeDubious",
            |s| s.exclusions.dubious,
            |s, v| s.exclusions.dubious = v,
        ),
        field(
            "excludeCitation",
            |s| s.exclusions.citation,
            |s, v| s.exclusions.citation = v,
        ),
        field(
            "excludeUndescribed",
            |s| s.exclusions.undescribed,
            |s, v| s.exclusions.undescribed = v,
        ),
        field(
            "excludeUnspecies",
            |s| s.exclusions.unranked,
            |s, v| s.exclusions.unranked = v,
        ),
        field(
            "legendMasterCheckbox",
            |s| s.legend_master,
            |s, v| s.legend_master = v,
        ),
        field(
            "filterType",
            |s| s.types.is_visible(T::TypeLocality),
            |s, v| s.types.set(T::TypeLocality, v),
        ),
        field(
            "filterSynonymizedType",
            |s| s.types.is_visible(T::SynonymizedTypeLocality),
            |s, v| s.types.set(T::SynonymizedTypeLocality, v),
        ),
        field(
            "filterDoubtfulType",
            |s| s.types.is_visible(T::DoubtfulTypeLocality),
            |s, v| s.types.set(T::DoubtfulTypeLocality, v),
        ),
        field(
            "filterDoubtfulSynonymizedType",
            |s| s.types.is_visible(T::DoubtfulSynonymizedTypeLocality),
            |s, v| s.types.set(T::DoubtfulSynonymizedTypeLocality, v),
        ),
        field(
            "filterSpecimen",
            |s| s.types.is_visible(T::SpecimenRecord),
            |s, v| s.types.set(T::SpecimenRecord, v),
        ),
        field(
            "filterLiteratureRecord",
            |s| s.types.is_visible(T::LiteratureRecord),
            |s, v| s.types.set(T::LiteratureRecord, v),
        ),
        field(
            "filterDoubtfulLiterature",
            |s| s.types.is_visible(T::DoubtfulLiteratureRecord),
            |s, v| s.types.set(T::DoubtfulLiteratureRecord, v),
        ),
        field(
            "toggleHigherTaxonomy",
            |s| s.show_higher_taxonomy,
            |s, v| s.show_higher_taxonomy = v,
        ),
    ]
}

/// Encode the non-default parts of `state` as a query string (no leading `?`)
pub fn encode(state: &FilterState) -> String {
    let defaults = FilterState::default();
    let mut params: Vec<(&str, String)> = Vec::new();

    let ranges = [
        (&state.publication_years, PUBLICATION_YEAR_FROM, PUBLICATION_YEAR_TO),
        (&state.collection_years, COLLECTION_YEAR_FROM, COLLECTION_YEAR_TO),
    ];
    for (range, from_key, to_key) in ranges {
        if range.enabled {
            if let Some(from) = range.from {
                params.push((from_key, from.to_string()));
            }
            if let Some(to) = range.to {
                params.push((to_key, to.to_string()));
            }
        }
    }
    if state.biennial.enabled {
        if let Some(target) = state.biennial.target_year {
            params.push((BIENNIAL_TARGET_YEAR, target.to_string()));
        }
        if let Some(interval) = state.biennial.interval {
            params.push((BIENNIAL_INTERVAL, interval.to_string()));
        }
    }

    for f in &bool_fields() {
        let value = (f.get)(state);
        if value != (f.get)(&defaults) {
            params.push((f.key, if value { "1" } else { "0" }.to_string()));
        }
    }

    let display = &state.display;
    let radios = [
        ("classification", display.classification.as_str(), defaults.display.classification.as_str()),
        ("chartMode", display.chart_mode.as_str(), defaults.display.chart_mode.as_str()),
        ("yearMode", display.year_axis.as_str(), defaults.display.year_axis.as_str()),
        ("countMode", display.year_count.as_str(), defaults.display.year_count.as_str()),
    ];
    for (key, value, default) in radios {
        if value != default {
            params.push((key, value.to_string()));
        }
    }

    for facet in [
        Facet::Order,
        Facet::Family,
        Facet::Genus,
        Facet::Species,
        Facet::Prefecture,
        Facet::Island,
        Facet::Literature,
    ] {
        let value = state.facets.get(facet);
        if value != defaults.facets.get(facet) {
            params.push((facet.param(), value.to_string()));
        }
    }

    let mask = state.months.mask();
    if mask != defaults.months.mask() {
        params.push((COLLECTION_MONTHS, mask));
    }

    let stages = &state.life_stages;
    if stages.enabled {
        if stages.adult {
            params.push((ADULT, "1".to_string()));
        }
        if stages.juvenile_unknown {
            params.push((JUVENILE_UNKNOWN, "1".to_string()));
        }
        if !stages.any_selected() {
            params.push((ADULT, "0".to_string()));
        }
    }

    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(&v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT)
        .to_string()
        .replace(' ', "+")
}

fn decode_component(value: &str) -> Result<String, CodecError> {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|_| CodecError::InvalidEncoding(value.to_string()))
}

/// Parsed query parameters; the first occurrence of a key wins
#[derive(Debug, Default)]
struct Params(HashMap<String, String>);

impl Params {
    fn parse(query: &str) -> Self {
        let mut map = HashMap::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            match (decode_component(raw_key), decode_component(raw_value)) {
                (Ok(key), Ok(value)) => {
                    map.entry(key).or_insert(value);
                }
                (Err(e), _) | (_, Err(e)) => debug!(error = %e, "Skipping query parameter"),
            }
        }
        Self(map)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

fn parse_year(key: &'static str, value: &str) -> Result<Option<i32>, CodecError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i32>()
        .map(Some)
        .map_err(|_| CodecError::InvalidYear {
            key,
            value: value.to_string(),
        })
}

fn parse_interval(value: &str) -> Result<Option<u32>, CodecError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| CodecError::InvalidInterval {
            key: BIENNIAL_INTERVAL,
            value: value.to_string(),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, CodecError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(CodecError::UnknownVariant {
            key,
            value: other.to_string(),
        }),
    }
}

fn parse_mask(value: &str) -> Result<[bool; 12], CodecError> {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() != 12 || chars.iter().any(|c| *c != '0' && *c != '1') {
        return Err(CodecError::InvalidMonthMask(value.to_string()));
    }
    let mut months = [false; 12];
    for (slot, c) in months.iter_mut().zip(chars) {
        *slot = c == '1';
    }
    Ok(months)
}

fn parse_variant<V>(
    key: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Option<V>,
) -> Result<V, CodecError> {
    parse(value).ok_or_else(|| CodecError::UnknownVariant {
        key,
        value: value.to_string(),
    })
}

/// Apply a field-level result, logging and keeping the default on error
fn apply<V>(result: Result<V, CodecError>, assign: impl FnOnce(V)) {
    match result {
        Ok(value) => assign(value),
        Err(e) => debug!(error = %e, "Ignoring malformed query parameter"),
    }
}

fn decode_range(params: &Params, range: &mut YearRangeFilter, from_key: &'static str, to_key: &'static str) {
    if params.has(from_key) || params.has(to_key) {
        range.enabled = true;
    }
    if let Some(v) = params.get(from_key) {
        apply(parse_year(from_key, v), |y| range.from = y);
    }
    if let Some(v) = params.get(to_key) {
        apply(parse_year(to_key, v), |y| range.to = y);
    }
}

/// Decode a query string (leading `?` optional) into a full state
pub fn decode(query: &str) -> FilterState {
    let params = Params::parse(query);
    let mut state = FilterState::default();

    decode_range(
        &params,
        &mut state.publication_years,
        PUBLICATION_YEAR_FROM,
        PUBLICATION_YEAR_TO,
    );
    decode_range(
        &params,
        &mut state.collection_years,
        COLLECTION_YEAR_FROM,
        COLLECTION_YEAR_TO,
    );

    if params.has(BIENNIAL_TARGET_YEAR) || params.has(BIENNIAL_INTERVAL) {
        state.biennial.enabled = true;
    }
    if let Some(v) = params.get(BIENNIAL_TARGET_YEAR) {
        apply(parse_year(BIENNIAL_TARGET_YEAR, v), |y| {
            state.biennial.target_year = y
        });
    }
    if let Some(v) = params.get(BIENNIAL_INTERVAL) {
        apply(parse_interval(v), |i| state.biennial.interval = i);
    }

    let adult = params.get(ADULT);
    let juvenile = params.get(JUVENILE_UNKNOWN);
    if adult.is_some() || juvenile.is_some() {
        state.life_stages.enabled = true;
        state.life_stages.adult = adult.is_some_and(|v| v != "0");
        state.life_stages.juvenile_unknown = juvenile.is_some_and(|v| v != "0");
    }

    for f in &bool_fields() {
        if let Some(v) = params.get(f.key) {
            apply(parse_bool(f.key, v), |b| (f.set)(&mut state, b));
        }
    }

    let display = &mut state.display;
    if let Some(v) = params.get("classification") {
        apply(parse_variant("classification", v, Classification::parse), |m| {
            display.classification = m
        });
    }
    if let Some(v) = params.get("chartMode") {
        apply(parse_variant("chartMode", v, ChartMode::parse), |m| {
            display.chart_mode = m
        });
    }
    if let Some(v) = params.get("yearMode") {
        apply(parse_variant("yearMode", v, YearAxis::parse), |m| {
            display.year_axis = m
        });
    }
    if let Some(v) = params.get("countMode") {
        apply(parse_variant("countMode", v, YearCountMode::parse), |m| {
            display.year_count = m
        });
    }

    for facet in Facet::ALL {
        if let Some(v) = params.get(facet.param()) {
            state.facets.set(facet, v);
        }
    }

    if let Some(v) = params.get(COLLECTION_MONTHS) {
        apply(parse_mask(v), |months| state.months.months = months);
    }

    state
}
