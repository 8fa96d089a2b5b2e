//! Immutable record store and its lookup tables
//!
//! The store is built once from loaded tables and never mutated afterwards.
//! Every lookup has a defined fallback so a missing entry never blocks the
//! rest of a record from rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lang::{Language, pick_label, strip_italics};
use crate::record::{PLACEHOLDER, Record};

/// Fallback bounds when no record carries a parseable year
pub const DEFAULT_YEAR_MIN: i32 = 1900;
pub const DEFAULT_YEAR_MAX: i32 = 2050;

/// Taxon metadata keyed by scientific name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonInfo {
    /// Sort ordinal; `None` sorts last
    pub ordinal: Option<u32>,
    pub japanese_name: String,
    pub author_year: String,
    /// Rank as written in the taxon table (order, family, genus, species, ...)
    pub rank: String,
}

impl TaxonInfo {
    pub fn has_author(&self) -> bool {
        !self.author_year.is_empty() && self.author_year != PLACEHOLDER
    }
}

/// One literature reference
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureEntry {
    pub id: String,
    pub ordinal: u32,
    pub label_ja: String,
    pub label_en: String,
    pub link: Option<String>,
}

impl LiteratureEntry {
    pub fn label(&self, lang: Language) -> String {
        pick_label(&self.label_ja, &self.label_en, lang)
    }
}

/// One prefecture or island row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMeta {
    pub ordinal: u32,
    pub ja: String,
    pub en: String,
}

/// Canonically ordered prefecture or island table
///
/// Order and bilingual metadata live in a single vector so that position `i`
/// always describes one entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTable {
    entries: Vec<RegionMeta>,
}

impl RegionTable {
    /// Build from unordered rows; rows are sorted by ordinal
    pub fn new(mut entries: Vec<RegionMeta>) -> Self {
        entries.sort_by_key(|e| e.ordinal);
        Self { entries }
    }

    pub fn entries(&self) -> &[RegionMeta] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Japanese names in canonical order
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.ja.as_str())
    }

    pub fn get(&self, ja: &str) -> Option<&RegionMeta> {
        self.entries.iter().find(|e| e.ja == ja)
    }

    pub fn position(&self, ja: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.ja == ja)
    }

    /// English label when the UI is English and one exists, otherwise the Japanese name
    pub fn label(&self, ja: &str, lang: Language) -> String {
        match (lang, self.get(ja)) {
            (Language::En, Some(meta)) if !meta.en.is_empty() && meta.en != PLACEHOLDER => {
                meta.en.clone()
            }
            _ => ja.to_string(),
        }
    }
}

/// Inclusive year range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_YEAR_MIN,
            max: DEFAULT_YEAR_MAX,
        }
    }
}

/// Year extents of the whole store, used to seed range controls
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub publication: YearRange,
    pub collection: YearRange,
}

/// Loaded records plus lookup tables
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    taxa: HashMap<String, TaxonInfo>,
    literature: Vec<LiteratureEntry>,
    literature_index: HashMap<String, usize>,
    prefectures: RegionTable,
    islands: RegionTable,
}

impl RecordStore {
    /// Create a store holding only records
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Create an empty store
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_taxa(mut self, taxa: HashMap<String, TaxonInfo>) -> Self {
        self.taxa = taxa;
        self
    }

    /// Attach the literature table; duplicate IDs keep their first entry
    pub fn with_literature(mut self, entries: Vec<LiteratureEntry>) -> Self {
        self.literature.clear();
        self.literature_index.clear();
        for entry in entries {
            if self.literature_index.contains_key(&entry.id) {
                warn!(id = %entry.id, "Duplicate literature ID ignored");
                continue;
            }
            self.literature_index
                .insert(entry.id.clone(), self.literature.len());
            self.literature.push(entry);
        }
        self
    }

    pub fn with_prefectures(mut self, table: RegionTable) -> Self {
        self.prefectures = table;
        self
    }

    pub fn with_islands(mut self, table: RegionTable) -> Self {
        self.islands = table;
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn taxon(&self, scientific_name: &str) -> Option<&TaxonInfo> {
        self.taxa.get(scientific_name)
    }

    /// Japanese name from the taxon table, or the placeholder
    pub fn taxon_japanese_name(&self, scientific_name: &str) -> &str {
        self.taxa
            .get(scientific_name)
            .map(|t| t.japanese_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(PLACEHOLDER)
    }

    /// Ordinal of a name whose table rank matches `rank`
    pub fn taxon_ordinal(&self, scientific_name: &str, rank: &str) -> Option<u32> {
        self.taxa
            .get(scientific_name)
            .filter(|t| t.rank == rank)
            .and_then(|t| t.ordinal)
    }

    /// Literature entries in table order
    pub fn literature(&self) -> &[LiteratureEntry] {
        &self.literature
    }

    pub fn literature_entry(&self, id: &str) -> Option<&LiteratureEntry> {
        self.literature_index.get(id).map(|&i| &self.literature[i])
    }

    /// Resolved literature label; unknown IDs get the localized sentinel
    pub fn literature_label(&self, id: &str, lang: Language) -> String {
        match self.literature_entry(id) {
            Some(entry) => entry.label(lang),
            None => lang.unknown_label().to_string(),
        }
    }

    /// Literature label with italic markup removed, for option lists
    pub fn literature_option_label(&self, id: &str, lang: Language) -> String {
        strip_italics(&self.literature_label(id, lang))
    }

    pub fn prefectures(&self) -> &RegionTable {
        &self.prefectures
    }

    pub fn islands(&self) -> &RegionTable {
        &self.islands
    }

    /// Min/max parseable years across all records, with fixed fallbacks
    pub fn year_bounds(&self) -> YearBounds {
        YearBounds {
            publication: year_range(self.records.iter().filter_map(|r| r.publication_year)),
            collection: year_range(self.records.iter().filter_map(|r| r.collection_year)),
        }
    }
}

fn year_range(years: impl Iterator<Item = i32>) -> YearRange {
    let (min, max) = years.fold((None, None), |(lo, hi): (Option<i32>, Option<i32>), y| {
        (
            Some(lo.map_or(y, |v| v.min(y))),
            Some(hi.map_or(y, |v| v.max(y))),
        )
    });
    match (min, max) {
        (Some(min), Some(max)) => YearRange { min, max },
        _ => YearRange::default(),
    }
}
