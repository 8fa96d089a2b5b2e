//! Occurrence records and their enumerated attributes
//!
//! A [`Record`] is one row of the distribution table after normalization at the
//! load boundary. Blank text cells become [`PLACEHOLDER`], blank or unparseable
//! numeric cells become `None`.

use serde::{Deserialize, Serialize};

/// Sentinel for an absent or unknown text value
pub const PLACEHOLDER: &str = "-";

/// Evidentiary status of an occurrence record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordType {
    TypeLocality,
    SynonymizedTypeLocality,
    DoubtfulTypeLocality,
    DoubtfulSynonymizedTypeLocality,
    SpecimenRecord,
    LiteratureRecord,
    DoubtfulLiteratureRecord,
}

impl RecordType {
    /// All types in wire order
    pub const ALL: [RecordType; 7] = [
        RecordType::TypeLocality,
        RecordType::SynonymizedTypeLocality,
        RecordType::DoubtfulTypeLocality,
        RecordType::DoubtfulSynonymizedTypeLocality,
        RecordType::SpecimenRecord,
        RecordType::LiteratureRecord,
        RecordType::DoubtfulLiteratureRecord,
    ];

    /// Stable English wire code
    pub fn code(&self) -> &'static str {
        match self {
            RecordType::TypeLocality => "type-locality",
            RecordType::SynonymizedTypeLocality => "synonymized-type-locality",
            RecordType::DoubtfulTypeLocality => "doubtful-type-locality",
            RecordType::DoubtfulSynonymizedTypeLocality => "doubtful-synonymized-type-locality",
            RecordType::SpecimenRecord => "specimen-record",
            RecordType::LiteratureRecord => "literature-record",
            RecordType::DoubtfulLiteratureRecord => "doubtful-literature-record",
        }
    }

    /// Value used by the distribution table itself
    pub fn source_label(&self) -> &'static str {
        match self {
            RecordType::TypeLocality => "1_タイプ産地",
            RecordType::SynonymizedTypeLocality => "2_統合された種のタイプ産地",
            RecordType::DoubtfulTypeLocality => "3_疑わしいタイプ産地",
            RecordType::DoubtfulSynonymizedTypeLocality => "4_疑わしい統合された種のタイプ産地",
            RecordType::SpecimenRecord => "5_標本記録",
            RecordType::LiteratureRecord => "6_文献記録",
            RecordType::DoubtfulLiteratureRecord => "7_疑わしい文献記録",
        }
    }

    /// Marker precedence; the highest value wins a spatial collision
    pub fn priority(&self) -> u8 {
        7 - self.index() as u8
    }

    /// Position in [`RecordType::ALL`]
    pub fn index(&self) -> usize {
        match self {
            RecordType::TypeLocality => 0,
            RecordType::SynonymizedTypeLocality => 1,
            RecordType::DoubtfulTypeLocality => 2,
            RecordType::DoubtfulSynonymizedTypeLocality => 3,
            RecordType::SpecimenRecord => 4,
            RecordType::LiteratureRecord => 5,
            RecordType::DoubtfulLiteratureRecord => 6,
        }
    }

    pub fn is_doubtful(&self) -> bool {
        matches!(
            self,
            RecordType::DoubtfulTypeLocality
                | RecordType::DoubtfulSynonymizedTypeLocality
                | RecordType::DoubtfulLiteratureRecord
        )
    }

    /// Parse either the table value or the English code. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.source_label() == raw || t.code() == raw)
    }
}

/// Taxonomic rank of the record's name
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxonRank {
    Species,
    Subspecies,
    SpeciesComplex,
    /// Any other rank, with its cell text as written
    Other(String),
}

impl Default for TaxonRank {
    fn default() -> Self {
        TaxonRank::Other(PLACEHOLDER.to_string())
    }
}

impl TaxonRank {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "species" => TaxonRank::Species,
            "subspecies" => TaxonRank::Subspecies,
            "species complex" | "species-complex" => TaxonRank::SpeciesComplex,
            _ => TaxonRank::Other(text_or_placeholder(raw)),
        }
    }

    /// Rank as named in the taxon table
    pub fn as_str(&self) -> &str {
        match self {
            TaxonRank::Species => "species",
            TaxonRank::Subspecies => "subspecies",
            TaxonRank::SpeciesComplex => "species complex",
            TaxonRank::Other(raw) => raw,
        }
    }

    /// Species or subspecies; everything else counts as unranked
    pub fn is_ranked(&self) -> bool {
        matches!(self, TaxonRank::Species | TaxonRank::Subspecies)
    }

    /// Ranks counted by the per-prefecture breakdown
    pub fn is_countable(&self) -> bool {
        matches!(
            self,
            TaxonRank::Species | TaxonRank::Subspecies | TaxonRank::SpeciesComplex
        )
    }
}

/// Normalized adult-presence flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Adult,
    #[default]
    JuvenileUnknown,
}

impl LifeStage {
    /// Only a trimmed, case-insensitive "yes" means adult
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("yes") {
            LifeStage::Adult
        } else {
            LifeStage::JuvenileUnknown
        }
    }
}

/// Free-text columns carried through to popups only
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordDetails {
    pub date: String,
    pub population: String,
    pub page: String,
    pub original_japanese_name: String,
    pub original_scientific_name: String,
    pub location: String,
    pub note: String,
    pub registrant: String,
    pub registration_date: String,
    pub collector_ja: String,
    pub collector_en: String,
}

impl Default for RecordDetails {
    fn default() -> Self {
        let p = || PLACEHOLDER.to_string();
        Self {
            date: p(),
            population: p(),
            page: p(),
            original_japanese_name: p(),
            original_scientific_name: p(),
            location: p(),
            note: p(),
            registrant: p(),
            registration_date: p(),
            collector_ja: p(),
            collector_en: p(),
        }
    }
}

/// One occurrence row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// `None` when the table value is not one of the seven known types
    pub record_type: Option<RecordType>,
    pub scientific_name: String,
    pub japanese_name: String,
    pub genus: String,
    pub family: String,
    pub order: String,
    pub taxon_rank: TaxonRank,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub prefecture: Option<String>,
    pub island: Option<String>,
    pub literature_id: Option<String>,
    pub collection_year: Option<i32>,
    pub publication_year: Option<i32>,
    pub collection_month: Option<u8>,
    pub life_stage: LifeStage,
    pub undescribed: bool,
    /// `false` marks a citation of an earlier record
    pub original: bool,
    pub details: RecordDetails,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            record_type: None,
            scientific_name: PLACEHOLDER.to_string(),
            japanese_name: PLACEHOLDER.to_string(),
            genus: PLACEHOLDER.to_string(),
            family: PLACEHOLDER.to_string(),
            order: PLACEHOLDER.to_string(),
            taxon_rank: TaxonRank::default(),
            latitude: None,
            longitude: None,
            prefecture: None,
            island: None,
            literature_id: None,
            collection_year: None,
            publication_year: None,
            collection_month: None,
            life_stage: LifeStage::JuvenileUnknown,
            undescribed: false,
            original: true,
            details: RecordDetails::default(),
        }
    }
}

impl Record {
    /// Selection identity of the species facet
    pub fn species_key(&self) -> String {
        combined_name(&self.scientific_name, &self.japanese_name)
    }

    /// Both coordinates, if present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    pub fn is_unpublished(&self) -> bool {
        self.literature_id.is_none()
    }

    pub fn has_scientific_name(&self) -> bool {
        !is_placeholder(&self.scientific_name)
    }

    /// Scientific name with a subspecies folded into its parent species
    pub fn species_name(&self) -> String {
        let name = self.scientific_name.trim();
        if self.taxon_rank == TaxonRank::Subspecies {
            parent_species(name)
        } else {
            name.to_string()
        }
    }
}

/// `scientific / japanese` pairing used as the species facet value
pub fn combined_name(scientific: &str, japanese: &str) -> String {
    format!("{} / {}", scientific, japanese)
}

/// First two whitespace-separated tokens of a scientific name
pub fn parent_species(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() >= 2 {
        format!("{} {}", parts[0], parts[1])
    } else {
        name.trim().to_string()
    }
}

pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER
}

/// Blank cells normalize to the placeholder
pub fn text_or_placeholder(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        raw.to_string()
    }
}

/// Blank or placeholder cells normalize to `None`
pub fn optional_text(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

/// Leading-integer parse: optional sign then digits, trailing text ignored
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i32>().ok().map(|v| v * sign)
}

/// Month 1..=12, anything else is absent
pub fn parse_month(raw: &str) -> Option<u8> {
    parse_year(raw)
        .filter(|m| (1..=12).contains(m))
        .map(|m| m as u8)
}

/// Coordinates of zero or garbage count as absent
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// Case-insensitive "yes"
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_priorities() {
        assert_eq!(RecordType::TypeLocality.priority(), 7);
        assert_eq!(RecordType::SpecimenRecord.priority(), 3);
        assert_eq!(RecordType::DoubtfulLiteratureRecord.priority(), 1);
    }

    #[test]
    fn test_record_type_parse_both_vocabularies() {
        assert_eq!(RecordType::parse("5_標本記録"), Some(RecordType::SpecimenRecord));
        assert_eq!(
            RecordType::parse("literature-record"),
            Some(RecordType::LiteratureRecord)
        );
        assert_eq!(RecordType::parse("8_その他"), None);
        assert_eq!(RecordType::parse("-"), None);
    }

    #[test]
    fn test_doubtful_types() {
        let doubtful: Vec<_> = RecordType::ALL.iter().filter(|t| t.is_doubtful()).collect();
        assert_eq!(doubtful.len(), 3);
    }

    #[test]
    fn test_taxon_rank_parse() {
        assert_eq!(TaxonRank::parse(" Species "), TaxonRank::Species);
        assert_eq!(TaxonRank::parse("species complex"), TaxonRank::SpeciesComplex);
        assert_eq!(TaxonRank::parse(" Genus "), TaxonRank::Other("Genus".to_string()));
        assert_eq!(TaxonRank::parse(""), TaxonRank::default());
        assert_eq!(TaxonRank::parse("species group").as_str(), "species group");
        assert!(!TaxonRank::SpeciesComplex.is_ranked());
        assert!(TaxonRank::SpeciesComplex.is_countable());
    }

    #[test]
    fn test_life_stage_normalization() {
        assert_eq!(LifeStage::from_raw(" YES "), LifeStage::Adult);
        assert_eq!(LifeStage::from_raw("no"), LifeStage::JuvenileUnknown);
        assert_eq!(LifeStage::from_raw("-"), LifeStage::JuvenileUnknown);
    }

    #[test]
    fn test_parse_year_like_leading_integer() {
        assert_eq!(parse_year("1990"), Some(1990));
        assert_eq!(parse_year(" 2001年"), Some(2001));
        assert_eq!(parse_year("-"), None);
        assert_eq!(parse_year("c.1990"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_parse_month_range() {
        assert_eq!(parse_month("7"), Some(7));
        assert_eq!(parse_month("13"), None);
        assert_eq!(parse_month("0"), None);
    }

    #[test]
    fn test_parse_coordinate_rejects_zero() {
        assert_eq!(parse_coordinate("35.5"), Some(35.5));
        assert_eq!(parse_coordinate("0"), None);
        assert_eq!(parse_coordinate("abc"), None);
    }

    #[test]
    fn test_species_name_folds_subspecies() {
        let record = Record {
            scientific_name: "Parafontaria laminata armigera".to_string(),
            taxon_rank: TaxonRank::Subspecies,
            ..Default::default()
        };
        assert_eq!(record.species_name(), "Parafontaria laminata");

        let species = Record {
            scientific_name: "Parafontaria laminata".to_string(),
            taxon_rank: TaxonRank::Species,
            ..Default::default()
        };
        assert_eq!(species.species_name(), "Parafontaria laminata");
    }

    #[test]
    fn test_species_key() {
        let record = Record {
            scientific_name: "Foo bar".to_string(),
            japanese_name: "フーバー".to_string(),
            ..Default::default()
        };
        assert_eq!(record.species_key(), "Foo bar / フーバー");
    }
}
