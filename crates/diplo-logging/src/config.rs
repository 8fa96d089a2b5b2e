//! Logging configuration
//!
//! Deserializable from the `[log]` table of the explorer's TOML file. Every
//! field has a default, so a partial table is enough.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where log events go and how verbose they are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or `diplo_core=debug`
    pub default_level: String,
    pub console: ConsoleConfig,
    /// JSON lines written to disk; off unless set
    pub file: Option<FileConfig>,
    pub jsonl: JsonlConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::pretty(),
            file: None,
            jsonl: JsonlConfig::default(),
        }
    }
}

impl LogConfig {
    /// Debug level, colored console
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// Info level to daily files under `log_dir`, nothing on the console
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            console: ConsoleConfig::off(),
            file: Some(FileConfig::in_dir(log_dir)),
            ..Self::default()
        }
    }

    /// Warnings only, plain JSON on the console
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            console: ConsoleConfig::json(),
            ..Self::default()
        }
    }
}

/// Console output, always on stderr
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Human-readable lines instead of JSON
    pub pretty: bool,
    pub ansi: bool,
}

impl ConsoleConfig {
    pub fn pretty() -> Self {
        Self {
            enabled: true,
            pretty: true,
            ansi: true,
        }
    }

    pub fn json() -> Self {
        Self {
            enabled: true,
            pretty: false,
            ansi: false,
        }
    }

    pub fn off() -> Self {
        Self {
            enabled: false,
            ..Self::json()
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::pretty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name stem; rotated files get a date suffix
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl FileConfig {
    pub fn in_dir(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "diplo".to_string(),
            rotation: RotationStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One `<prefix>.log`, truncated at startup
    Never,
}

/// Shape of each JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Event fields at the top level rather than under `fields`
    pub flatten_events: bool,
    pub include_spans: bool,
    /// Source file and line of the log call
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_location: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = LogConfig::default();
        assert_eq!(default.default_level, "info");
        assert_eq!(default.console, ConsoleConfig::pretty());
        assert!(default.file.is_none());

        let dev = LogConfig::development();
        assert_eq!(dev.default_level, "debug");
        assert!(dev.console.ansi);

        let testing = LogConfig::testing();
        assert!(testing.console.enabled);
        assert!(!testing.console.pretty);
    }

    #[test]
    fn test_production_writes_files_only() {
        let config = LogConfig::production(PathBuf::from("/var/log/diplo"));
        assert!(!config.console.enabled);
        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/var/log/diplo"));
        assert_eq!(file.prefix, "diplo");
        assert_eq!(file.rotation, RotationStrategy::Daily);
    }

    #[test]
    fn test_partial_toml() {
        let config: LogConfig = toml::from_str(
            r#"
            default_level = "diplo_core=debug,warn"

            [console]
            pretty = false

            [file]
            directory = "/tmp/diplo-logs"
            rotation = "never"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_level, "diplo_core=debug,warn");
        assert!(config.console.enabled);
        assert!(!config.console.pretty);
        let file = config.file.unwrap();
        assert_eq!(file.prefix, "diplo");
        assert_eq!(file.rotation, RotationStrategy::Never);
        assert!(config.jsonl.flatten_events);
    }
}
