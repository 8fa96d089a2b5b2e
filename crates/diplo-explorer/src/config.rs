//! Explorer configuration
//!
//! Defaults, then an optional TOML file, then command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use diplo_core::Language;
use diplo_core::loader::{
    ISLANDS_FILE, LITERATURE_FILE, PREFECTURES_FILE, RECORDS_FILE, TAXA_FILE, TablePaths,
};
use diplo_core::markers::{DEFAULT_NEARBY_RADIUS_PX, DEFAULT_THINNING_RADIUS_PX, Viewport};
use diplo_core::view::MapSettings;
use diplo_logging::LogConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, ExplorerResult};

/// Where the five upstream tables live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub directory: PathBuf,
    pub records: String,
    pub taxa: String,
    pub prefectures: String,
    pub islands: String,
    pub literature: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./data"),
            records: RECORDS_FILE.to_string(),
            taxa: TAXA_FILE.to_string(),
            prefectures: PREFECTURES_FILE.to_string(),
            islands: ISLANDS_FILE.to_string(),
            literature: LITERATURE_FILE.to_string(),
        }
    }
}

impl DataPaths {
    pub fn table_paths(&self) -> TablePaths {
        let dir = &self.directory;
        TablePaths {
            records: dir.join(&self.records),
            taxa: dir.join(&self.taxa),
            prefectures: dir.join(&self.prefectures),
            islands: dir.join(&self.islands),
            literature: dir.join(&self.literature),
        }
    }
}

/// Map view used for marker thinning and the nearby lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: f64,
    pub width_px: u32,
    pub height_px: u32,
    /// Markers closer than this many pixels collapse into one
    pub thinning_radius_px: f64,
    /// Pixel radius of the nearby-record lookup
    pub nearby_radius_px: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            center_lat: 36.68917,
            center_lng: 139.8192,
            zoom: 8.5,
            width_px: 1280,
            height_px: 800,
            thinning_radius_px: DEFAULT_THINNING_RADIUS_PX,
            nearby_radius_px: DEFAULT_NEARBY_RADIUS_PX,
        }
    }
}

impl MarkerConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport::from_center(
            self.center_lat,
            self.center_lng,
            self.zoom,
            self.width_px,
            self.height_px,
        )
    }

    pub fn map_settings(&self) -> MapSettings {
        MapSettings {
            viewport: self.viewport(),
            thinning_radius_px: self.thinning_radius_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub data: DataPaths,
    pub language: Language,
    /// Quiescence window for continuous inputs
    pub debounce_ms: u64,
    pub marker: MarkerConfig,
    pub log: LogConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            data: DataPaths::default(),
            language: Language::Ja,
            debounce_ms: diplo_core::DEBOUNCE_DELAY.as_millis() as u64,
            marker: MarkerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ExplorerConfig {
    /// Read a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> ExplorerResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ExplorerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ExplorerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_or_default(path: Option<&Path>) -> ExplorerResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_data_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.data.directory = directory.into();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExplorerConfig::default();
        assert_eq!(config.language, Language::Ja);
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.marker.thinning_radius_px, 5.0);
        assert_eq!(config.marker.nearby_radius_px, 10.0);
        let paths = config.data.table_paths();
        assert_eq!(paths.records, PathBuf::from("./data/DistributionRecord_web.csv"));
        assert_eq!(paths.literature, PathBuf::from("./data/Literature.csv"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
language = "en"
debounce_ms = 250

[data]
directory = "/srv/atlas"

[marker]
zoom = 6.0

[log]
default_level = "debug"
"#
        )
        .unwrap();

        let config = ExplorerConfig::load(file.path()).unwrap();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.data.directory, PathBuf::from("/srv/atlas"));
        assert_eq!(config.data.taxa, "TaxonName.csv");
        assert_eq!(config.marker.zoom, 6.0);
        assert_eq!(config.marker.width_px, 1280);
        assert_eq!(config.log.default_level, "debug");
    }

    #[test]
    fn test_load_errors() {
        let missing = ExplorerConfig::load(Path::new("/nonexistent/diplo.toml"));
        assert!(matches!(missing, Err(ExplorerError::ConfigIo { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms = \"soon\"").unwrap();
        let invalid = ExplorerConfig::load(file.path());
        assert!(matches!(invalid, Err(ExplorerError::ConfigParse { .. })));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ExplorerConfig::default()
            .with_data_dir("/tmp/data")
            .with_language(Language::En)
            .with_debounce_ms(0);
        assert_eq!(config.data.directory, PathBuf::from("/tmp/data"));
        assert_eq!(config.language, Language::En);
        assert_eq!(config.debounce(), Duration::ZERO);
    }
}
