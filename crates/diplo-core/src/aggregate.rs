//! Chart aggregations over a visible record set
//!
//! Each aggregation is recomputed from scratch on every call and returns a
//! plain serializable value for an external chart renderer.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::lang::Language;
use crate::record::{LifeStage, PLACEHOLDER, Record, RecordType};
use crate::state::{ChartMode, Classification, YearAxis, YearCountMode};
use crate::store::RecordStore;

/// Distinct site/species/stage occurrences per month, index 0 is January
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCounts {
    pub adult: [usize; 12],
    pub juvenile_unknown: [usize; 12],
}

pub fn monthly_counts(visible: &[&Record]) -> MonthlyCounts {
    let mut adult: [HashSet<(u64, u64, &str)>; 12] = Default::default();
    let mut juvenile: [HashSet<(u64, u64, &str)>; 12] = Default::default();

    for record in visible {
        let (Some(month), Some((lat, lng))) = (record.collection_month, record.coordinates())
        else {
            continue;
        };
        if !(1..=12).contains(&month) {
            continue;
        }
        let key = (lat.to_bits(), lng.to_bits(), record.scientific_name.as_str());
        let slot = usize::from(month - 1);
        match record.life_stage {
            LifeStage::Adult => adult[slot].insert(key),
            LifeStage::JuvenileUnknown => juvenile[slot].insert(key),
        };
    }

    MonthlyCounts {
        adult: adult.map(|s| s.len()),
        juvenile_unknown: juvenile.map(|s| s.len()),
    }
}

/// One higher taxon's bars across the ordered prefectures
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaxonSeries {
    pub taxon: String,
    /// `scientific / japanese` legend text
    pub label: String,
    /// Plotted values: counts, or percentages in ratio mode
    pub values: Vec<f64>,
    /// Underlying counts behind `values`
    pub absolute: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefectureChart {
    /// Canonical Japanese prefecture names in display order
    pub prefectures: Vec<String>,
    /// Axis labels in the UI language
    pub labels: Vec<String>,
    pub series: Vec<TaxonSeries>,
}

#[derive(Default)]
struct PrefectureTally {
    species: HashMap<String, BTreeSet<String>>,
    records: HashMap<String, usize>,
}

impl PrefectureTally {
    fn species_total(&self) -> usize {
        self.species.values().map(BTreeSet::len).sum()
    }

    fn record_total(&self) -> usize {
        self.records.values().sum()
    }
}

/// Per-prefecture breakdown by order or family
///
/// Count and record modes order prefectures by descending total; ratio mode
/// keeps the canonical prefecture order.
pub fn prefecture_chart(
    store: &RecordStore,
    visible: &[&Record],
    classification: Classification,
    mode: ChartMode,
    exclude_undescribed: bool,
    lang: Language,
) -> PrefectureChart {
    let mut tallies: HashMap<&str, PrefectureTally> = HashMap::new();

    for record in visible {
        if !record.taxon_rank.is_countable() || (exclude_undescribed && record.undescribed) {
            continue;
        }
        let Some(prefecture) = record.prefecture.as_deref() else {
            continue;
        };
        let taxon = match classification {
            Classification::Order => record.order.as_str(),
            Classification::Family => record.family.as_str(),
        };
        if taxon.is_empty() || taxon == PLACEHOLDER {
            continue;
        }
        let tally = tallies.entry(prefecture).or_default();
        tally
            .species
            .entry(taxon.to_string())
            .or_default()
            .insert(record.species_name());
        *tally.records.entry(taxon.to_string()).or_default() += 1;
    }

    let prefectures: Vec<&str> = match mode {
        ChartMode::Ratio => store
            .prefectures()
            .order()
            .filter(|p| tallies.contains_key(p))
            .collect(),
        ChartMode::Count | ChartMode::Record => {
            let mut ranked: Vec<(&str, usize)> = tallies
                .iter()
                .map(|(p, t)| {
                    let total = if mode == ChartMode::Record {
                        t.record_total()
                    } else {
                        t.species_total()
                    };
                    (*p, total)
                })
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            ranked.into_iter().map(|(p, _)| p).collect()
        }
    };

    let taxa: BTreeSet<&str> = tallies
        .values()
        .flat_map(|t| t.species.keys().map(String::as_str))
        .collect();

    let series = taxa
        .into_iter()
        .map(|taxon| {
            let mut values = Vec::with_capacity(prefectures.len());
            let mut absolute = Vec::with_capacity(prefectures.len());
            for prefecture in &prefectures {
                let tally = &tallies[prefecture];
                let count = if mode == ChartMode::Record {
                    tally.records.get(taxon).copied().unwrap_or(0)
                } else {
                    tally.species.get(taxon).map_or(0, BTreeSet::len)
                };
                absolute.push(count);
                values.push(if mode == ChartMode::Ratio {
                    percentage(count, tally.species_total())
                } else {
                    count as f64
                });
            }
            TaxonSeries {
                taxon: taxon.to_string(),
                label: format!("{} / {}", taxon, store.taxon_japanese_name(taxon)),
                values,
                absolute,
            }
        })
        .collect();

    PrefectureChart {
        labels: prefectures
            .iter()
            .map(|p| store.prefectures().label(p, lang))
            .collect(),
        prefectures: prefectures.into_iter().map(str::to_string).collect(),
        series,
    }
}

/// Share rounded to one decimal place
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Per-record-type bars across the year range
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSeries {
    pub record_type: RecordType,
    pub values: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearChart {
    /// Every year from the first to the last present, gaps included
    pub years: Vec<i32>,
    /// Record types with a non-zero total, in wire order
    pub series: Vec<YearSeries>,
    pub cumulative: Vec<usize>,
}

impl YearChart {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Per-year breakdown by record type plus a running total
pub fn year_chart(visible: &[&Record], axis: YearAxis, unit: YearCountMode) -> YearChart {
    let mut counts: BTreeMap<i32, [usize; 7]> = BTreeMap::new();
    let mut species: BTreeMap<i32, [HashSet<&str>; 7]> = BTreeMap::new();

    for record in visible {
        let year = match axis {
            YearAxis::Publication => record.publication_year,
            YearAxis::Collection => record.collection_year,
        };
        let (Some(year), Some(record_type)) = (year, record.record_type) else {
            continue;
        };
        if !record.has_scientific_name() {
            continue;
        }
        let slot = record_type.index();
        match unit {
            YearCountMode::Record => counts.entry(year).or_default()[slot] += 1,
            YearCountMode::Species => {
                species.entry(year).or_default()[slot].insert(record.scientific_name.as_str());
            }
        }
    }

    let bounds = match unit {
        YearCountMode::Record => counts.keys().next().zip(counts.keys().next_back()),
        YearCountMode::Species => species.keys().next().zip(species.keys().next_back()),
    };
    let Some((&first, &last)) = bounds else {
        return YearChart::default();
    };
    let years: Vec<i32> = (first..=last).collect();

    let per_type = |t: RecordType| -> Vec<usize> {
        years
            .iter()
            .map(|y| match unit {
                YearCountMode::Record => counts.get(y).map_or(0, |c| c[t.index()]),
                YearCountMode::Species => species.get(y).map_or(0, |s| s[t.index()].len()),
            })
            .collect()
    };

    let series: Vec<YearSeries> = RecordType::ALL
        .into_iter()
        .map(|t| YearSeries {
            record_type: t,
            values: per_type(t),
        })
        .filter(|s| s.values.iter().sum::<usize>() > 0)
        .collect();

    let cumulative = match unit {
        YearCountMode::Record => years
            .iter()
            .enumerate()
            .scan(0usize, |running, (i, _)| {
                *running += series.iter().map(|s| s.values[i]).sum::<usize>();
                Some(*running)
            })
            .collect(),
        YearCountMode::Species => {
            let mut seen: HashSet<&str> = HashSet::new();
            years
                .iter()
                .map(|y| {
                    if let Some(sets) = species.get(y) {
                        for set in sets {
                            seen.extend(set.iter().copied());
                        }
                    }
                    seen.len()
                })
                .collect()
        }
    };

    YearChart {
        years,
        series,
        cumulative,
    }
}
