//! End-to-end flow: CSV tables on disk, a query string, a JSONL event script
//! and the snapshots written for it.

use std::fs;
use std::path::Path;
use std::time::Duration;

use diplo_core::{codec, load_store};
use diplo_explorer::events::read_events;
use diplo_explorer::{AppState, ExplorerConfig, SnapshotWriter, run_events};
use tokio::sync::mpsc;

const RECORD_HEADER: &str = "記録の分類_タイプ産地or標本記録or文献記録or疑わしいかどうか,学名,和名,Genus,Family,Order,階級,Latitude_assumed,Longitude_assumed,都道府県_jp,文献ID,採集年,出版年,採集月,成体の有無";

fn write_tables(dir: &Path) {
    let rows = [
        "5_標本記録,Parafontaria laminata,ヤケヤスデ,Parafontaria,Xystodesmidae,Polydesmida,species,36.5,139.9,栃木県,L1,1995,2001,7,yes",
        "1_タイプ産地,Parafontaria tonominea,トノミネヤスデ,Parafontaria,Xystodesmidae,Polydesmida,species,35.0,138.0,静岡県,L2,1960,1962,10,no",
        "6_文献記録,Oxidus gracilis,ヤケヤスデ,Oxidus,Paradoxosomatidae,Polydesmida,species,34.0,135.0,大阪府,L1,1980,2001,,",
        "7_疑わしい文献記録,Oxidus gracilis,ヤケヤスデ,Oxidus,Paradoxosomatidae,Polydesmida,species,43.0,141.0,北海道,L2,1950,1962,,",
    ];
    let mut records = String::from(RECORD_HEADER);
    for row in rows {
        records.push('\n');
        records.push_str(row);
    }
    fs::write(dir.join("DistributionRecord_web.csv"), records).unwrap();

    fs::write(
        dir.join("Prefecture.csv"),
        "no,都道府県_jp,prefecture_en\n1,北海道,Hokkaido\n9,栃木県,Tochigi\n22,静岡県,Shizuoka\n27,大阪府,Osaka\n",
    )
    .unwrap();
    fs::write(
        dir.join("Literature.csv"),
        "Lnumber,LID_CSV,LitList_en,LitList_jp,Link\n1,L1,Author A (2001) Millipedes.,著者A (2001) ヤスデ.,https://example.org/l1\n2,L2,Author B (1962) Type series.,著者B (1962) タイプ.,\n",
    )
    .unwrap();
}

fn load_app(dir: &Path, query: &str) -> (AppState, ExplorerConfig) {
    let config_path = dir.join("diplo.toml");
    fs::write(
        &config_path,
        format!(
            "language = \"en\"\ndebounce_ms = 200\n\n[data]\ndirectory = {:?}\n",
            dir.display().to_string()
        ),
    )
    .unwrap();
    let config = ExplorerConfig::load(&config_path).unwrap();
    let store = load_store(&config.data.table_paths());
    let app = AppState::new(store, codec::decode(query), config.language, &config.marker);
    (app, config)
}

#[tokio::test]
async fn test_event_script_produces_snapshots() {
    diplo_logging::init_testing();
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());
    let (mut app, config) = load_app(dir.path(), "filterFamily=Xystodesmidae");
    assert_eq!(app.store().len(), 4);
    assert_eq!(app.view().record_info.record_count, 2);
    assert_eq!(config.debounce(), Duration::from_millis(200));

    let script = r#"{"event":"set_chart_mode","value":"ratio"}
{"event":"set_range_enabled","target":"publication","enabled":true}
{"event":"set_range","target":"publication","from":2000,"to":2001}
{"event":"set_language","language":"en"}
not an event
{"event":"select_record","index":0}
{"event":"cycle_facet","facet":"family","direction":"next"}
"#;
    let (tx, rx) = mpsc::unbounded_channel();
    read_events(script.as_bytes(), tx).await.unwrap();

    let mut writer = SnapshotWriter::new(Vec::new());
    writer.publish(&app).unwrap();
    let recomputes = run_events(&mut app, rx, config.debounce(), |app| writer.publish(app))
        .await
        .unwrap();
    assert_eq!(recomputes, 4);

    let out = String::from_utf8(writer.into_inner()).unwrap();
    let snapshots: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(snapshots.len(), 5);

    // Seeded range covers both Xystodesmidae records
    assert_eq!(snapshots[2]["view"]["record_info"]["record_count"], 2);
    assert!(
        snapshots[2]["view"]["query"]
            .as_str()
            .unwrap()
            .contains("publicationYearFrom=1962")
    );

    // The unchanged language leaves the range pending; the selection flushes it
    let selected = &snapshots[3];
    assert_eq!(selected["view"]["record_info"]["record_count"], 1);
    assert_eq!(selected["language"], "en");
    assert_eq!(selected["nearby"]["clicked"], 0);
    assert_eq!(selected["nearby"]["records"][0]["scientific_name"], "Parafontaria laminata");
    assert_eq!(selected["nearby"]["records"][0]["prefecture"], "Tochigi");

    let last = &snapshots[4];
    let query = last["view"]["query"].as_str().unwrap();
    assert!(query.contains("publicationYearFrom=2000"));
    assert!(query.contains("chartMode=ratio"));
    assert!(query.contains("filterFamily=Paradoxosomatidae"));
    assert!(last.get("nearby").is_none());
    assert_eq!(last["view"]["record_info"]["record_count"], 1);
    assert_eq!(last["total_events"], 6);
    assert_eq!(last["revision"], 4);
}

#[tokio::test]
async fn test_restored_state_round_trips_through_view_query() {
    diplo_logging::init_testing();
    let dir = tempfile::tempdir().unwrap();
    write_tables(dir.path());
    let query = "filterDoubtfulLiterature=1&excludeDubious=0&filterPrefecture=%E5%8C%97%E6%B5%B7%E9%81%93";
    let (app, _) = load_app(dir.path(), query);

    assert_eq!(app.view().record_info.record_count, 1);
    assert_eq!(app.state().facets.prefecture, "北海道");
    assert_eq!(codec::decode(&app.view().query), *app.state());
    assert_eq!(app.view().literature.len(), 1);
    assert_eq!(app.view().literature[0].id, "L2");
}

#[tokio::test]
async fn test_missing_tables_give_empty_view() {
    diplo_logging::init_testing();
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = load_app(dir.path(), "");
    assert!(app.store().is_empty());
    assert_eq!(app.view().record_info.record_count, 0);
    assert!(app.view().markers.is_empty());

    let mut writer = SnapshotWriter::new(Vec::new());
    writer.publish(&app).unwrap();
    assert_eq!(writer.written(), 1);
}
