//! Taxonomic list view: order → family → genus → species → subspecies

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::record::{Record, TaxonRank, parent_species};
use crate::store::RecordStore;

/// Japanese name shown when a subspecies' parent is missing from the taxon table
pub const UNKNOWN_PARENT: &str = "(親種名不明)";

/// Order, family or genus heading
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HigherTaxon {
    pub name: String,
    pub japanese_name: String,
    pub author_year: Option<String>,
    /// Families of an order, genera of a family; empty for a genus
    pub children: Vec<HigherTaxon>,
    /// Species of a genus; empty otherwise
    pub species: Vec<SpeciesEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    /// Running number across the whole list
    pub number: usize,
    pub scientific_name: String,
    pub japanese_name: String,
    pub author_year: Option<String>,
    pub subspecies: Vec<SubspeciesEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubspeciesEntry {
    /// `n.k` under species `n`
    pub number: String,
    pub scientific_name: String,
    pub japanese_name: String,
    pub author_year: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomicList {
    pub orders: Vec<HigherTaxon>,
    /// Whether order/family/genus headings are shown
    pub show_higher_taxonomy: bool,
}

impl TaxonomicList {
    pub fn species_count(&self) -> usize {
        self.orders
            .iter()
            .flat_map(|o| &o.children)
            .flat_map(|f| &f.children)
            .map(|g| g.species.len())
            .sum()
    }
}

struct SpeciesSlot {
    rank: TaxonRank,
    japanese_name: String,
    subspecies: BTreeSet<(String, String)>,
}

type GenusMap = BTreeMap<String, SpeciesSlot>;
type Tree = BTreeMap<String, BTreeMap<String, BTreeMap<String, GenusMap>>>;

/// `A b b` style subspecies
fn is_nominotypical(name: &str) -> bool {
    let parts: Vec<&str> = name.split(' ').collect();
    parts.len() == 3 && parts[1] == parts[2]
}

/// Build the list from the visible records
pub fn build_taxonomic_list(
    store: &RecordStore,
    visible: &[&Record],
    show_higher_taxonomy: bool,
) -> TaxonomicList {
    let mut tree: Tree = BTreeMap::new();
    for record in visible.iter().filter(|r| r.has_scientific_name()) {
        let genus_map = tree
            .entry(record.order.clone())
            .or_default()
            .entry(record.family.clone())
            .or_default()
            .entry(record.genus.clone())
            .or_default();

        if record.taxon_rank == TaxonRank::Subspecies {
            let parent = parent_species(&record.scientific_name);
            let slot = genus_map.entry(parent.clone()).or_insert_with(|| SpeciesSlot {
                rank: TaxonRank::Species,
                japanese_name: store
                    .taxon(&parent)
                    .map(|t| t.japanese_name.clone())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UNKNOWN_PARENT.to_string()),
                subspecies: BTreeSet::new(),
            });
            slot.subspecies.insert((
                record.scientific_name.clone(),
                record.japanese_name.clone(),
            ));
        } else {
            genus_map
                .entry(record.scientific_name.clone())
                .or_insert_with(|| SpeciesSlot {
                    rank: record.taxon_rank.clone(),
                    japanese_name: record.japanese_name.clone(),
                    subspecies: BTreeSet::new(),
                });
        }
    }

    let ordinal = |name: &str, rank: &str| store.taxon_ordinal(name, rank).unwrap_or(u32::MAX);
    let author = |name: &str| {
        store
            .taxon(name)
            .filter(|t| t.has_author())
            .map(|t| t.author_year.clone())
    };
    let heading = |name: &str, children: Vec<HigherTaxon>, species: Vec<SpeciesEntry>| HigherTaxon {
        name: name.to_string(),
        japanese_name: store.taxon_japanese_name(name).to_string(),
        author_year: author(name),
        children,
        species,
    };
    let sorted = |names: Vec<String>, rank: &str| {
        let mut names = names;
        names.sort_by_key(|n| ordinal(n, rank));
        names
    };

    let mut counter = 1usize;
    let mut orders = Vec::new();
    for order in sorted(tree.keys().cloned().collect(), "order") {
        let families_map = &tree[&order];
        let mut families = Vec::new();
        for family in sorted(families_map.keys().cloned().collect(), "family") {
            let genera_map = &families_map[&family];
            let mut genera = Vec::new();
            for genus in sorted(genera_map.keys().cloned().collect(), "genus") {
                let mut entries: Vec<(&String, &SpeciesSlot)> = genera_map[&genus].iter().collect();
                entries.sort_by(|a, b| {
                    ordinal(a.0, a.1.rank.as_str())
                        .cmp(&ordinal(b.0, b.1.rank.as_str()))
                        .then_with(|| a.0.cmp(b.0))
                });

                let mut species = Vec::new();
                for (name, slot) in entries {
                    let mut subs: Vec<&(String, String)> = slot.subspecies.iter().collect();
                    subs.sort_by(|a, b| {
                        is_nominotypical(&b.0)
                            .cmp(&is_nominotypical(&a.0))
                            .then_with(|| a.0.cmp(&b.0))
                    });
                    let subspecies = subs
                        .into_iter()
                        .enumerate()
                        .map(|(k, (sci, jpn))| SubspeciesEntry {
                            number: format!("{}.{}", counter, k + 1),
                            scientific_name: sci.clone(),
                            japanese_name: jpn.clone(),
                            author_year: author(sci),
                        })
                        .collect();
                    species.push(SpeciesEntry {
                        number: counter,
                        scientific_name: name.clone(),
                        japanese_name: slot.japanese_name.clone(),
                        author_year: author(name),
                        subspecies,
                    });
                    counter += 1;
                }
                genera.push(heading(&genus, Vec::new(), species));
            }
            families.push(heading(&family, genera, Vec::new()));
        }
        orders.push(heading(&order, families, Vec::new()));
    }

    TaxonomicList {
        orders,
        show_higher_taxonomy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaxonInfo;
    use std::collections::HashMap;

    fn taxon(ordinal: u32, jpn: &str, rank: &str) -> TaxonInfo {
        TaxonInfo {
            ordinal: Some(ordinal),
            japanese_name: jpn.to_string(),
            author_year: "-".to_string(),
            rank: rank.to_string(),
        }
    }

    fn record(genus: &str, sci: &str, jpn: &str, rank: TaxonRank) -> Record {
        Record {
            order: "Polydesmida".to_string(),
            family: "Xystodesmidae".to_string(),
            genus: genus.to_string(),
            scientific_name: sci.to_string(),
            japanese_name: jpn.to_string(),
            taxon_rank: rank,
            ..Default::default()
        }
    }

    #[test]
    fn test_tree_numbering_and_order() {
        let mut taxa = HashMap::new();
        taxa.insert("Parafontaria".to_string(), taxon(2, "ヤケヤスデ属", "genus"));
        taxa.insert("Xystodesmus".to_string(), taxon(1, "アカヤスデ属", "genus"));
        taxa.insert("Parafontaria laminata".to_string(), taxon(10, "ヤマキシャヤスデ", "species"));
        taxa.insert(
            "Parafontaria tonominea".to_string(),
            TaxonInfo {
                author_year: "(Attems, 1899)".to_string(),
                ..taxon(5, "キシャヤスデ", "species")
            },
        );
        let store = RecordStore::empty().with_taxa(taxa);

        let records = vec![
            record("Parafontaria", "Parafontaria laminata armigera", "A", TaxonRank::Subspecies),
            record("Parafontaria", "Parafontaria laminata laminata", "B", TaxonRank::Subspecies),
            record("Parafontaria", "Parafontaria tonominea", "キシャヤスデ", TaxonRank::Species),
            record("Xystodesmus", "Xystodesmus sp.", "-", TaxonRank::default()),
            record("Xystodesmus", "-", "-", TaxonRank::Species),
        ];
        let visible: Vec<&Record> = records.iter().collect();
        let list = build_taxonomic_list(&store, &visible, true);

        assert_eq!(list.orders.len(), 1);
        let genera = &list.orders[0].children[0].children;
        assert_eq!(genera[0].name, "Xystodesmus");
        assert_eq!(genera[0].japanese_name, "アカヤスデ属");
        assert_eq!(genera[1].name, "Parafontaria");

        assert_eq!(genera[0].species[0].number, 1);
        let parafontaria = &genera[1].species;
        assert_eq!(parafontaria[0].scientific_name, "Parafontaria tonominea");
        assert_eq!(parafontaria[0].number, 2);
        assert_eq!(parafontaria[0].author_year.as_deref(), Some("(Attems, 1899)"));

        let laminata = &parafontaria[1];
        assert_eq!(laminata.number, 3);
        assert_eq!(laminata.japanese_name, "ヤマキシャヤスデ");
        assert_eq!(laminata.subspecies[0].scientific_name, "Parafontaria laminata laminata");
        assert_eq!(laminata.subspecies[0].number, "3.1");
        assert_eq!(laminata.subspecies[1].number, "3.2");
        assert_eq!(list.species_count(), 3);
    }

    #[test]
    fn test_other_rank_sorts_by_table_ordinal() {
        let mut taxa = HashMap::new();
        taxa.insert("Foo alpha".to_string(), taxon(9, "アルファ", "species"));
        taxa.insert("Foo zeta group".to_string(), taxon(1, "ゼータ", "species group"));
        let store = RecordStore::empty().with_taxa(taxa);

        let records = vec![
            record("Foo", "Foo alpha", "アルファ", TaxonRank::Species),
            record("Foo", "Foo zeta group", "ゼータ", TaxonRank::parse("species group")),
        ];
        let visible: Vec<&Record> = records.iter().collect();
        let list = build_taxonomic_list(&store, &visible, true);

        let species = &list.orders[0].children[0].children[0].species;
        assert_eq!(species[0].scientific_name, "Foo zeta group");
        assert_eq!(species[1].scientific_name, "Foo alpha");
    }

    #[test]
    fn test_unknown_parent_name() {
        let records = vec![record("Foo", "Foo bar baz", "X", TaxonRank::Subspecies)];
        let visible: Vec<&Record> = records.iter().collect();
        let list = build_taxonomic_list(&RecordStore::empty(), &visible, false);
        let species = &list.orders[0].children[0].children[0].species[0];
        assert_eq!(species.scientific_name, "Foo bar");
        assert_eq!(species.japanese_name, UNKNOWN_PARENT);
        assert!(!list.show_higher_taxonomy);
    }

    #[test]
    fn test_nominotypical() {
        assert!(is_nominotypical("Foo bar bar"));
        assert!(!is_nominotypical("Foo bar baz"));
        assert!(!is_nominotypical("Foo bar"));
    }
}
