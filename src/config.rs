use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{capture::IdleRows, error::SnapshotError};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// CSV file, truncated at startup.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// First row of the CSV.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub idle_rows: IdleRows,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeysConfig {
    #[serde(default = "default_toggle_key")]
    pub toggle: char,
    #[serde(default = "default_labels")]
    pub labels: Vec<LabelBinding>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LabelBinding {
    pub key: char,
    pub label: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_window_title")]
    pub title: String,
    #[serde(default = "default_window_width")]
    pub width: f32,
    #[serde(default = "default_window_height")]
    pub height: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_output_path() -> PathBuf { PathBuf::from("skeletal_tracking.csv") }
fn default_title() -> String { "Kat's Test".to_string() }
fn default_toggle_key() -> char { 'a' }
fn default_window_title() -> String { "Skeleton Snapshot".to_string() }
fn default_window_width() -> f32 { 1024.0 }
fn default_window_height() -> f32 { 848.0 }
fn default_fps() -> u32 { 30 }

fn default_labels() -> Vec<LabelBinding> {
    [
        ('1', "ANXIETY"),
        ('2', "DISINTEREST"),
        ('3', "INTEREST"),
        ('4', "JOY"),
        ('5', "TIRED"),
        ('6', "ANGER"),
        ('7', "CONFIDENT"),
        ('8', "VUNERABLE"),
    ]
    .into_iter()
    .map(|(key, label)| LabelBinding {
        key,
        label: label.to_string(),
    })
    .collect()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            title: default_title(),
            idle_rows: IdleRows::default(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            toggle: default_toggle_key(),
            labels: default_labels(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_window_title(),
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SnapshotError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| SnapshotError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Missing file means defaults; a file that exists must parse.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.output.path, PathBuf::from("skeletal_tracking.csv"));
        assert_eq!(config.output.title, "Kat's Test");
        assert_eq!(config.output.idle_rows, IdleRows::Blank);
        assert_eq!(config.keys.toggle, 'a');
        assert_eq!(config.keys.labels.len(), 8);
        assert_eq!(config.sensor.fps, 30);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [output]
            path = "run.csv"
            idle_rows = "untracked"

            [keys]
            toggle = "r"
            labels = [{ key = "q", label = "CALM" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.output.path, PathBuf::from("run.csv"));
        assert_eq!(config.output.title, "Kat's Test");
        assert_eq!(config.output.idle_rows, IdleRows::Untracked);
        assert_eq!(config.keys.toggle, 'r');
        assert_eq!(
            config.keys.labels,
            vec![LabelBinding {
                key: 'q',
                label: "CALM".to_string()
            }]
        );
        assert_eq!(config.window.width, 1024.0);
    }

    #[test]
    fn idle_rows_none_is_accepted() {
        let config = Config::parse("[output]\nidle_rows = \"none\"\n").unwrap();
        assert_eq!(config.output.idle_rows, IdleRows::Suppressed);
    }

    #[test]
    fn multi_char_key_is_rejected() {
        assert!(Config::parse("[keys]\ntoggle = \"ab\"\n").is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("snapshot.toml")).unwrap();
        assert_eq!(config.keys.labels.len(), 8);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.toml");
        fs::write(&path, "[output\n").unwrap();
        let err = Config::load_or_default(&path).unwrap_err();
        assert!(matches!(err, SnapshotError::ConfigParse { .. }));
    }
}
