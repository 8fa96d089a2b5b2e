//! Table loading at the store boundary
//!
//! Each upstream table is parsed with the `csv` crate (quoted fields may carry
//! the delimiter) into strictly typed values. Rows that are not valid UTF-8
//! are logged and skipped. [`load_store`] never fails: a table that cannot be
//! read is logged and contributes nothing.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::error::{DiploResult, LoadError};
use crate::record::{
    LifeStage, Record, RecordDetails, RecordType, TaxonRank, optional_text, parse_coordinate,
    parse_flag, parse_month, parse_year, text_or_placeholder,
};
use crate::store::{LiteratureEntry, RecordStore, RegionMeta, RegionTable, TaxonInfo};

pub const RECORDS_FILE: &str = "DistributionRecord_web.csv";
pub const TAXA_FILE: &str = "TaxonName.csv";
pub const PREFECTURES_FILE: &str = "Prefecture.csv";
pub const ISLANDS_FILE: &str = "Island.csv";
pub const LITERATURE_FILE: &str = "Literature.csv";

/// Column headers of the distribution table
mod column {
    pub const RECORD_TYPE: &str = "記録の分類_タイプ産地or標本記録or文献記録or疑わしいかどうか";
    pub const JAPANESE_NAME: &str = "和名";
    pub const SCIENTIFIC_NAME: &str = "学名";
    pub const LATITUDE: &str = "Latitude_assumed";
    pub const LONGITUDE: &str = "Longitude_assumed";
    pub const DATE: &str = "日付";
    pub const PREFECTURE: &str = "都道府県_jp";
    pub const ISLAND: &str = "島_jp";
    pub const GENUS: &str = "Genus";
    pub const FAMILY: &str = "Family";
    pub const ORDER: &str = "Order";
    pub const POPULATION: &str = "個体数";
    pub const LITERATURE_ID: &str = "文献ID";
    pub const PAGE: &str = "掲載ページ";
    pub const ORIGINAL: &str = "オリジナル";
    pub const ORIGINAL_JAPANESE_NAME: &str = "文献中の和名";
    pub const ORIGINAL_SCIENTIFIC_NAME: &str = "文献中で有効とされる学名_文献紹介など、その文献中で有効とされる学名がわからない場合はハイフンを記入してください。";
    pub const LOCATION: &str = "場所（原文ママ）";
    pub const NOTE: &str = "メモ";
    pub const REGISTRANT: &str = "記入者";
    pub const REGISTRATION_DATE: &str = "記入日付";
    pub const ADULT_PRESENCE: &str = "成体の有無";
    pub const COLLECTOR_JA: &str = "採集者_jp";
    pub const COLLECTOR_EN: &str = "採集者_en";
    pub const COLLECTION_MONTH: &str = "採集月";
    pub const COLLECTION_YEAR: &str = "採集年";
    pub const PUBLICATION_YEAR: &str = "出版年";
    pub const TAXON_RANK: &str = "階級";
    pub const UNDESCRIBED: &str = "未記載種の可能性が高い_幼体等で同定が困難な場合はno";
}

/// Locations of the five upstream tables
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TablePaths {
    pub records: PathBuf,
    pub taxa: PathBuf,
    pub prefectures: PathBuf,
    pub islands: PathBuf,
    pub literature: PathBuf,
}

impl TablePaths {
    /// Standard file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            records: dir.join(RECORDS_FILE),
            taxa: dir.join(TAXA_FILE),
            prefectures: dir.join(PREFECTURES_FILE),
            islands: dir.join(ISLANDS_FILE),
            literature: dir.join(LITERATURE_FILE),
        }
    }
}

/// Load every table, substituting an empty contribution for any that fails
pub fn load_store(paths: &TablePaths) -> RecordStore {
    let records = load_or_empty(&paths.records, RECORDS_FILE, read_records);
    let taxa = load_or_empty(&paths.taxa, TAXA_FILE, read_taxa);
    let prefectures = load_or_empty(&paths.prefectures, PREFECTURES_FILE, |r| {
        read_regions(r, PREFECTURES_FILE)
    });
    let islands = load_or_empty(&paths.islands, ISLANDS_FILE, |r| {
        read_regions(r, ISLANDS_FILE)
    });
    let literature = load_or_empty(&paths.literature, LITERATURE_FILE, read_literature);
    assemble(records, taxa, prefectures, islands, literature)
}

/// Load every table, failing on the first one that cannot be read or parsed
pub fn try_load_store(paths: &TablePaths) -> DiploResult<RecordStore> {
    let records = read_records(File::open(&paths.records).map_err(LoadError::from)?)?;
    let taxa = read_taxa(File::open(&paths.taxa).map_err(LoadError::from)?)?;
    let prefectures = read_regions(
        File::open(&paths.prefectures).map_err(LoadError::from)?,
        PREFECTURES_FILE,
    )?;
    let islands = read_regions(
        File::open(&paths.islands).map_err(LoadError::from)?,
        ISLANDS_FILE,
    )?;
    let literature = read_literature(File::open(&paths.literature).map_err(LoadError::from)?)?;
    Ok(assemble(records, taxa, prefectures, islands, literature))
}

fn assemble(
    records: Vec<Record>,
    taxa: HashMap<String, TaxonInfo>,
    prefectures: RegionTable,
    islands: RegionTable,
    literature: Vec<LiteratureEntry>,
) -> RecordStore {
    info!(
        records = records.len(),
        taxa = taxa.len(),
        prefectures = prefectures.len(),
        islands = islands.len(),
        literature = literature.len(),
        "Record store loaded"
    );

    RecordStore::new(records)
        .with_taxa(taxa)
        .with_prefectures(prefectures)
        .with_islands(islands)
        .with_literature(literature)
}

fn load_or_empty<T, F>(path: &Path, table: &'static str, parse: F) -> T
where
    T: Default,
    F: FnOnce(File) -> Result<T, LoadError>,
{
    let result = File::open(path)
        .map_err(LoadError::from)
        .and_then(parse);
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(table, path = %path.display(), error = %e, "Failed to load table, using empty contribution");
            T::default()
        }
    }
}

fn reader<R: Read>(input: R, has_headers: bool) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input)
}

fn csv_error(table: &'static str, err: csv::Error) -> LoadError {
    LoadError::Csv {
        table,
        message: err.to_string(),
    }
}

/// A parsed row, or `None` for a row with invalid UTF-8 that is skipped
fn decoded_row(
    table: &'static str,
    result: csv::Result<StringRecord>,
) -> Result<Option<StringRecord>, LoadError> {
    match result {
        Ok(fields) => Ok(Some(fields)),
        Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
            let line = e.position().map_or(0, |p| p.line());
            warn!(table, line, error = %e, "Skipping row with invalid UTF-8");
            Ok(None)
        }
        Err(e) => Err(csv_error(table, e)),
    }
}

fn header_names(
    rdr: &mut csv::Reader<impl Read>,
    table: &'static str,
) -> Result<Vec<String>, LoadError> {
    let headers = rdr.headers().map_err(|e| csv_error(table, e))?;
    if headers.is_empty() {
        return Err(LoadError::EmptyTable(table));
    }
    Ok(headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect())
}

fn is_blank_row(row: &StringRecord) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

/// Named-column view over one distribution row
struct Row<'a> {
    index: &'a HashMap<String, usize>,
    fields: &'a StringRecord,
}

impl Row<'_> {
    fn raw(&self, name: &str) -> &str {
        self.index
            .get(name)
            .and_then(|&i| self.fields.get(i))
            .unwrap_or("")
    }

    fn text(&self, name: &str) -> String {
        text_or_placeholder(self.raw(name))
    }
}

/// Parse the distribution table. Unknown columns are ignored, absent ones read as blank.
pub fn read_records<R: Read>(input: R) -> Result<Vec<Record>, LoadError> {
    const TABLE: &str = RECORDS_FILE;
    let mut rdr = reader(input, true);
    let headers = header_names(&mut rdr, TABLE)?;
    let index: HashMap<String, usize> = headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| (h, i))
        .collect();
    if !index.contains_key(column::RECORD_TYPE) {
        return Err(LoadError::MissingColumn {
            table: TABLE,
            column: column::RECORD_TYPE.to_string(),
        });
    }

    let mut records = Vec::new();
    let mut unknown_types = 0usize;
    for result in rdr.records() {
        let Some(fields) = decoded_row(TABLE, result)? else {
            continue;
        };
        if is_blank_row(&fields) {
            continue;
        }
        let row = Row {
            index: &index,
            fields: &fields,
        };
        let record = record_from_row(&row);
        if record.record_type.is_none() {
            unknown_types += 1;
        }
        records.push(record);
    }

    if unknown_types > 0 {
        debug!(count = unknown_types, "Records with unrecognized record type");
    }
    Ok(records)
}

fn record_from_row(row: &Row<'_>) -> Record {
    Record {
        record_type: RecordType::parse(row.raw(column::RECORD_TYPE)),
        scientific_name: row.text(column::SCIENTIFIC_NAME),
        japanese_name: row.text(column::JAPANESE_NAME),
        genus: row.text(column::GENUS),
        family: row.text(column::FAMILY),
        order: row.text(column::ORDER),
        taxon_rank: TaxonRank::parse(row.raw(column::TAXON_RANK)),
        latitude: parse_coordinate(row.raw(column::LATITUDE)),
        longitude: parse_coordinate(row.raw(column::LONGITUDE)),
        prefecture: optional_text(row.raw(column::PREFECTURE)),
        island: optional_text(row.raw(column::ISLAND)),
        literature_id: optional_text(row.raw(column::LITERATURE_ID)),
        collection_year: parse_year(row.raw(column::COLLECTION_YEAR)),
        publication_year: parse_year(row.raw(column::PUBLICATION_YEAR)),
        collection_month: parse_month(row.raw(column::COLLECTION_MONTH)),
        life_stage: LifeStage::from_raw(row.raw(column::ADULT_PRESENCE)),
        undescribed: parse_flag(row.raw(column::UNDESCRIBED)),
        original: !row.raw(column::ORIGINAL).trim().eq_ignore_ascii_case("no"),
        details: RecordDetails {
            date: row.text(column::DATE),
            population: row.text(column::POPULATION),
            page: row.text(column::PAGE),
            original_japanese_name: row.text(column::ORIGINAL_JAPANESE_NAME),
            original_scientific_name: row.text(column::ORIGINAL_SCIENTIFIC_NAME),
            location: row.text(column::LOCATION),
            note: row.text(column::NOTE),
            registrant: row.text(column::REGISTRANT),
            registration_date: row.text(column::REGISTRATION_DATE),
            collector_ja: row.text(column::COLLECTOR_JA),
            collector_en: row.text(column::COLLECTOR_EN),
        },
    }
}

/// Parse the taxon table: no, japanese name, scientific name, author/year, rank
pub fn read_taxa<R: Read>(input: R) -> Result<HashMap<String, TaxonInfo>, LoadError> {
    let mut rdr = reader(input, true);
    let mut taxa = HashMap::new();
    for result in rdr.records() {
        let Some(fields) = decoded_row(TAXA_FILE, result)? else {
            continue;
        };
        if fields.len() < 5 {
            continue;
        }
        let scientific_name = fields[2].to_string();
        if scientific_name.is_empty() {
            continue;
        }
        taxa.insert(
            scientific_name,
            TaxonInfo {
                ordinal: parse_year(&fields[0]).and_then(|n| u32::try_from(n).ok()),
                japanese_name: text_or_placeholder(&fields[1]),
                author_year: text_or_placeholder(&fields[3]),
                rank: text_or_placeholder(&fields[4]),
            },
        );
    }
    Ok(taxa)
}

/// Parse a prefecture or island table located by its `no`, `_jp` and `_en` headers
pub fn read_regions<R: Read>(input: R, table: &'static str) -> Result<RegionTable, LoadError> {
    let mut rdr = reader(input, true);
    let headers: Vec<String> = header_names(&mut rdr, table)?
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();
    let find = |needle: &str| {
        headers
            .iter()
            .position(|h| h.contains(needle))
            .ok_or_else(|| LoadError::MissingColumn {
                table,
                column: needle.to_string(),
            })
    };
    let no_idx = find("no")?;
    let ja_idx = find("_jp")?;
    let en_idx = find("_en")?;

    let mut entries = Vec::new();
    for result in rdr.records() {
        let Some(fields) = decoded_row(table, result)? else {
            continue;
        };
        let ordinal = fields
            .get(no_idx)
            .and_then(parse_year)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|&n| n != 0);
        let Some(ordinal) = ordinal else {
            continue;
        };
        entries.push(RegionMeta {
            ordinal,
            ja: text_or_placeholder(fields.get(ja_idx).unwrap_or("")),
            en: text_or_placeholder(fields.get(en_idx).unwrap_or("")),
        });
    }
    Ok(RegionTable::new(entries))
}

/// Parse the literature table: Lnumber, LID_CSV, LitList_en, LitList_jp, Link
pub fn read_literature<R: Read>(input: R) -> Result<Vec<LiteratureEntry>, LoadError> {
    let mut rdr = reader(input, true);
    let mut entries = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let Some(fields) = decoded_row(LITERATURE_FILE, result)? else {
            continue;
        };
        if is_blank_row(&fields) {
            continue;
        }
        let field = |n: usize| fields.get(n).unwrap_or("").to_string();
        let line = (i + 1) as u32;
        let link = field(4);
        entries.push(LiteratureEntry {
            id: field(1),
            ordinal: parse_year(&field(0))
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(line),
            label_en: field(2),
            label_ja: field(3),
            link: if link.is_empty() { None } else { Some(link) },
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiploError;
    use crate::lang::Language;
    use std::fs;
    use tempfile::TempDir;

    fn records_csv() -> String {
        let header = [
            column::RECORD_TYPE,
            column::JAPANESE_NAME,
            column::SCIENTIFIC_NAME,
            column::LATITUDE,
            column::LONGITUDE,
            column::PREFECTURE,
            column::ORDER,
            column::LITERATURE_ID,
            column::ORIGINAL,
            column::ADULT_PRESENCE,
            column::COLLECTION_MONTH,
            column::COLLECTION_YEAR,
            column::TAXON_RANK,
            column::LOCATION,
            "未知の列",
        ]
        .join(",");
        format!(
            "{header}\n\
             5_標本記録,ヤスデ,Foo bar,35.1,139.2,東京都,Julida,L1,yes,Yes,7,1990,species,\"Mt. A, east slope\",x\n\
             9_不明,ヤスデ,Foo bar,,,,,,,,,,,,\n\
             6_文献記録,,Baz qux,0,abc,-,,-,no,no,13,c.1990,species complex,,\n"
        )
    }

    #[test]
    fn test_read_records_normalizes_fields() {
        let records = read_records(records_csv().as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.record_type, Some(RecordType::SpecimenRecord));
        assert_eq!(first.coordinates(), Some((35.1, 139.2)));
        assert_eq!(first.prefecture.as_deref(), Some("東京都"));
        assert_eq!(first.literature_id.as_deref(), Some("L1"));
        assert_eq!(first.life_stage, LifeStage::Adult);
        assert_eq!(first.collection_month, Some(7));
        assert_eq!(first.collection_year, Some(1990));
        assert_eq!(first.details.location, "Mt. A, east slope");
        assert_eq!(first.genus, "-");
        assert!(first.original);

        assert_eq!(records[1].record_type, None);

        let third = &records[2];
        assert_eq!(third.japanese_name, "-");
        assert_eq!(third.latitude, None);
        assert_eq!(third.longitude, None);
        assert_eq!(third.prefecture, None);
        assert!(third.is_unpublished());
        assert!(!third.original);
        assert_eq!(third.collection_month, None);
        assert_eq!(third.collection_year, None);
        assert_eq!(third.taxon_rank, TaxonRank::SpeciesComplex);
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let mut csv = format!(
            "{},{}\n5_標本記録,Foo bar\n",
            column::RECORD_TYPE,
            column::SCIENTIFIC_NAME
        )
        .into_bytes();
        csv.extend_from_slice(b"5_\xe6\xa8,Broken\n");
        csv.extend_from_slice("6_文献記録,Baz qux\n".as_bytes());

        let records = read_records(csv.as_slice()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.scientific_name.as_str()).collect();
        assert_eq!(names, vec!["Foo bar", "Baz qux"]);

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RECORDS_FILE), &csv).unwrap();
        let store = load_store(&TablePaths::in_dir(dir.path()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_read_records_requires_type_column() {
        let err = read_records("和名,学名\nA,B\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { .. }));
    }

    #[test]
    fn test_read_taxa() {
        let csv = "no,和名,学名,著者,階級\n\
                   1,ヒキツリヤスデ目,Julida,\"Brandt, 1833\",order\n\
                   x,,Foo bar,,species\n\
                   short,row\n";
        let taxa = read_taxa(csv.as_bytes()).unwrap();
        assert_eq!(taxa.len(), 2);
        let julida = &taxa["Julida"];
        assert_eq!(julida.ordinal, Some(1));
        assert_eq!(julida.author_year, "Brandt, 1833");
        assert_eq!(taxa["Foo bar"].ordinal, None);
        assert_eq!(taxa["Foo bar"].japanese_name, "-");
    }

    #[test]
    fn test_read_regions_sorted() {
        let csv = "No,prefecture_jp,prefecture_en\n2,青森県,Aomori\n1,北海道,Hokkaido\n,空,Empty\n";
        let table = read_regions(csv.as_bytes(), PREFECTURES_FILE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.order().collect::<Vec<_>>(), vec!["北海道", "青森県"]);
        assert_eq!(table.label("青森県", Language::En), "Aomori");
    }

    #[test]
    fn test_read_regions_missing_column() {
        let err = read_regions("No,name\n1,x\n".as_bytes(), ISLANDS_FILE).unwrap_err();
        match err {
            LoadError::MissingColumn { table, column } => {
                assert_eq!(table, ISLANDS_FILE);
                assert_eq!(column, "_jp");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_literature() {
        let csv = "Lnumber,LID_CSV,LitList_en,LitList_jp,Link\n\
                   1,L1,\"Smith, 2001\",スミス 2001,https://doi.org/x\n\
                   ?,L2,,田中 1999,\n";
        let entries = read_literature(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label_en, "Smith, 2001");
        assert_eq!(entries[0].link.as_deref(), Some("https://doi.org/x"));
        assert_eq!(entries[1].ordinal, 2);
        assert_eq!(entries[1].link, None);
    }

    #[test]
    fn test_read_literature_skips_invalid_utf8() {
        let mut csv = b"Lnumber,LID_CSV,LitList_en,LitList_jp,Link\n1,L1,Smith 2001,,\n".to_vec();
        csv.extend_from_slice(b"2,L2,\xff\xfe,,\n3,L3,Tanaka 1999,,\n");
        let entries = read_literature(csv.as_slice()).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "L3"]);
    }

    #[test]
    fn test_load_store_tolerates_missing_tables() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RECORDS_FILE), records_csv()).unwrap();
        fs::write(
            dir.path().join(PREFECTURES_FILE),
            "no,pref_jp,pref_en\n1,東京都,Tokyo\n",
        )
        .unwrap();

        let store = load_store(&TablePaths::in_dir(dir.path()));
        assert_eq!(store.len(), 3);
        assert_eq!(store.prefectures().len(), 1);
        assert!(store.islands().is_empty());
        assert!(store.literature().is_empty());
        assert_eq!(store.literature_label("L1", Language::Ja), "不明");
    }

    #[test]
    fn test_load_store_from_empty_directory() {
        let dir = TempDir::new().unwrap();
        let store = load_store(&TablePaths::in_dir(dir.path()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_try_load_store_reports_first_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RECORDS_FILE), records_csv()).unwrap();
        fs::write(dir.path().join(TAXA_FILE), "no,和名,学名,著者,階級\n").unwrap();

        let err = try_load_store(&TablePaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, DiploError::Load(LoadError::Io(_))));

        fs::write(dir.path().join(PREFECTURES_FILE), "no,pref_jp,pref_en\n1,東京都,Tokyo\n").unwrap();
        fs::write(dir.path().join(ISLANDS_FILE), "no,island_jp,island_en\n").unwrap();
        fs::write(dir.path().join(LITERATURE_FILE), "Lnumber,LID_CSV,LitList_en,LitList_jp,Link\n").unwrap();
        let store = try_load_store(&TablePaths::in_dir(dir.path())).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.prefectures().len(), 1);
    }
}
