//! Filter state
//!
//! [`FilterState`] is the single canonical value describing every filter,
//! facet selection and display mode. `FilterState::default()` is the default
//! state that the query-string codec diffs against.

use serde::{Deserialize, Serialize};

use crate::record::{LifeStage, RecordType};

/// One exact-match filter dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Species,
    Genus,
    Family,
    Order,
    Prefecture,
    Island,
    Literature,
}

impl Facet {
    pub const ALL: [Facet; 7] = [
        Facet::Species,
        Facet::Genus,
        Facet::Family,
        Facet::Order,
        Facet::Prefecture,
        Facet::Island,
        Facet::Literature,
    ];

    /// Query-string parameter carrying this facet's selection
    pub fn param(&self) -> &'static str {
        match self {
            Facet::Species => "filterSpecies",
            Facet::Genus => "filterGenus",
            Facet::Family => "filterFamily",
            Facet::Order => "filterOrder",
            Facet::Prefecture => "filterPrefecture",
            Facet::Island => "filterIsland",
            Facet::Literature => "filterLiterature",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Facet::Species => "species",
            Facet::Genus => "genus",
            Facet::Family => "family",
            Facet::Order => "order",
            Facet::Prefecture => "prefecture",
            Facet::Island => "island",
            Facet::Literature => "literature",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == value)
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Seven facet selections; an empty string means no selection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSelections {
    pub species: String,
    pub genus: String,
    pub family: String,
    pub order: String,
    pub prefecture: String,
    pub island: String,
    pub literature: String,
}

impl FacetSelections {
    pub fn get(&self, facet: Facet) -> &str {
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

    pub fn set(&mut self, facet: Facet, value: impl Into<String>) {
        let slot = match facet {
            Facet::Species => &mut self.species,
            Facet::Genus => &mut self.genus,
            Facet::Family => &mut self.family,
            Facet::Order => &mut self.order,
            Facet::Prefecture => &mut self.prefecture,
            Facet::Island => &mut self.island,
            Facet::Literature => &mut self.literature,
        };
        *slot = value.into();
    }

    pub fn clear(&mut self, facet: Facet) {
        self.set(facet, String::new());
    }

    /// Facets with a non-empty selection
    pub fn active(&self) -> impl Iterator<Item = (Facet, &str)> {
        Facet::ALL
            .into_iter()
            .map(|f| (f, self.get(f)))
            .filter(|(_, v)| !v.is_empty())
    }
}

/// Per-record-type visibility toggles, indexed in [`RecordType::ALL`] order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeVisibility([bool; 7]);

impl Default for TypeVisibility {
    fn default() -> Self {
        Self([true, true, false, false, true, true, false])
    }
}

impl TypeVisibility {
    pub fn all(visible: bool) -> Self {
        Self([visible; 7])
    }

    pub fn is_visible(&self, record_type: RecordType) -> bool {
        self.0[record_type.index()]
    }

    pub fn set(&mut self, record_type: RecordType, visible: bool) {
        self.0[record_type.index()] = visible;
    }

    pub fn any_doubtful(&self) -> bool {
        RecordType::ALL
            .into_iter()
            .any(|t| t.is_doubtful() && self.is_visible(t))
    }
}

/// Independent exclusion toggles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusions {
    pub unpublished: bool,
    pub dubious: bool,
    pub citation: bool,
    pub undescribed: bool,
    pub unranked: bool,
}

impl Default for Exclusions {
    fn default() -> Self {
        Self {
            unpublished: false,
            dubious: true,
            citation: true,
            undescribed: false,
            unranked: false,
        }
    }
}

/// Inclusive year range; a missing bound is open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRangeFilter {
    pub enabled: bool,
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRangeFilter {
    /// Whether `year` lies in the range; a missing bound leaves that side unbounded
    pub fn contains(&self, year: i32) -> bool {
        self.from.is_none_or(|from| year >= from) && self.to.is_none_or(|to| year <= to)
    }
}

/// Every `interval` years anchored at `target_year`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiennialFilter {
    pub enabled: bool,
    pub target_year: Option<i32>,
    pub interval: Option<u32>,
}

impl BiennialFilter {
    /// Target and positive interval, when the filter can apply at all
    pub fn parameters(&self) -> Option<(i32, u32)> {
        match (self.target_year, self.interval) {
            (Some(target), Some(interval)) if interval > 0 => Some((target, interval)),
            _ => None,
        }
    }

    /// Sign-agnostic periodicity check
    pub fn matches(target: i32, interval: u32, year: i32) -> bool {
        (i64::from(year) - i64::from(target)).rem_euclid(i64::from(interval)) == 0
    }
}

/// Month multi-select; index 0 is January
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthFilter {
    pub enabled: bool,
    pub months: [bool; 12],
}

impl Default for MonthFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            months: [true; 12],
        }
    }
}

impl MonthFilter {
    pub fn is_selected(&self, month: u8) -> bool {
        (1..=12).contains(&month) && self.months[usize::from(month - 1)]
    }

    pub fn any_selected(&self) -> bool {
        self.months.iter().any(|&m| m)
    }

    /// Twelve-character `0`/`1` mask
    pub fn mask(&self) -> String {
        self.months.iter().map(|&m| if m { '1' } else { '0' }).collect()
    }
}

/// Adult vs juvenile/unknown multi-select
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeStageFilter {
    pub enabled: bool,
    pub adult: bool,
    pub juvenile_unknown: bool,
}

impl Default for LifeStageFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            adult: true,
            juvenile_unknown: true,
        }
    }
}

impl LifeStageFilter {
    pub fn is_selected(&self, stage: LifeStage) -> bool {
        match stage {
            LifeStage::Adult => self.adult,
            LifeStage::JuvenileUnknown => self.juvenile_unknown,
        }
    }

    pub fn any_selected(&self) -> bool {
        self.adult || self.juvenile_unknown
    }
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

wire_enum!(
    /// Higher taxon used by the prefecture chart
    Classification { Order => "order", Family => "family" }
);

wire_enum!(
    /// Unit of the prefecture chart
    ChartMode { Count => "count", Ratio => "ratio", Record => "record" }
);

wire_enum!(
    /// Year column of the year chart
    YearAxis { Publication => "publication", Collection => "collection" }
);

wire_enum!(
    /// Unit of the year chart
    YearCountMode { Record => "record", Species => "species" }
);

/// Chart display selections
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayModes {
    pub classification: Classification,
    pub chart_mode: ChartMode,
    pub year_axis: YearAxis,
    pub year_count: YearCountMode,
}

/// Complete filter and display state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub facets: FacetSelections,
    pub types: TypeVisibility,
    pub exclusions: Exclusions,
    pub publication_years: YearRangeFilter,
    pub collection_years: YearRangeFilter,
    pub biennial: BiennialFilter,
    pub months: MonthFilter,
    pub life_stages: LifeStageFilter,
    /// Legend master toggle; sets all seven type toggles when changed
    pub legend_master: bool,
    /// Show order/family/genus headings in the taxonomic list
    pub show_higher_taxonomy: bool,
    pub display: DisplayModes,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            facets: FacetSelections::default(),
            types: TypeVisibility::default(),
            exclusions: Exclusions::default(),
            publication_years: YearRangeFilter::default(),
            collection_years: YearRangeFilter::default(),
            biennial: BiennialFilter::default(),
            months: MonthFilter::default(),
            life_stages: LifeStageFilter::default(),
            legend_master: true,
            show_higher_taxonomy: true,
            display: DisplayModes::default(),
        }
    }
}

impl FilterState {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Copy of this state with one facet cleared
    pub fn without_facet(&self, facet: Facet) -> Self {
        let mut state = self.clone();
        state.facets.clear(facet);
        state
    }
}
