//! Browser configuration: where the data lives, how captures are taken, how toasts look.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::{CaptureOptions, ToastPosition};

const APP_QUALIFIER: &str = "com";
const APP_ORGANISATION: &str = "FileBrowser";
const APP_NAME: &str = "file-browser";

/// Environment variable overriding [`BrowserConfig::data_directory`].
pub const DATA_DIR_ENV: &str = "FILE_BROWSER_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToastSettings {
    pub duration_ms: u64,
    pub position: ToastPosition,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self { duration_ms: 3_000, position: ToastPosition::Bottom }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserConfig {
    /// Root every relative folder is resolved against.
    pub data_directory: PathBuf,
    /// Folder opened on startup, relative to the data directory.
    pub initial_folder: String,
    pub show_hidden: bool,
    pub capture: CaptureOptions,
    /// Directory the camera drops new shots into.
    pub capture_inbox: PathBuf,
    /// Directory processed captures are written to before being moved into place.
    pub capture_output: PathBuf,
    /// Program used to open files. `None` picks the platform opener.
    pub viewer_program: Option<String>,
    pub toast: ToastSettings,
    /// Appended to new text files whose name has no extension.
    pub new_file_extension: String,
}

/// Per-user application data directory; the temp directory when the platform has none.
pub(crate) fn data_root() -> PathBuf {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANISATION, APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let data_root = data_root();

        Self {
            data_directory: data_root.join("files"),
            initial_folder: String::new(),
            show_hidden: true,
            capture: CaptureOptions::default(),
            capture_inbox: data_root.join("camera"),
            capture_output: std::env::temp_dir().join(format!("{APP_NAME}-captures")),
            viewer_program: None,
            toast: ToastSettings::default(),
            new_file_extension: "txt".to_string(),
        }
    }
}

impl BrowserConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a JSON config file; missing keys fall back to defaults, then environment overrides
    /// are applied.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("reading config at {}", path.display()))?;
        let config: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Like [`BrowserConfig::load`], but a missing file yields [`BrowserConfig::from_env`].
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() { Self::load(path) } else { Ok(Self::from_env()) }
    }

    pub fn with_data_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_directory = path.into();
        self
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|value| !value.trim().is_empty()) {
            self.data_directory = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Encoding;

    #[test]
    fn defaults_match_the_camera_screen() {
        let config = BrowserConfig::default();
        assert_eq!(config.capture.quality, 20);
        assert_eq!(config.capture.encoding, Encoding::Jpeg);
        assert!(config.capture.correct_orientation);
        assert!(!config.capture.save_to_photo_album);
        assert_eq!(config.toast.duration_ms, 3_000);
        assert_eq!(config.new_file_extension, "txt");
        assert!(config.data_directory.ends_with("files"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("browser.json");
        fs::write(&path, r#"{ "dataDirectory": "/sdcard/app", "capture": { "quality": 80 } }"#)
            .unwrap();

        let config = BrowserConfig::load(&path).expect("load config");
        assert_eq!(config.capture.quality, 80);
        assert!(config.capture.correct_orientation);
        assert_eq!(config.toast, ToastSettings::default());
        assert!(config.show_hidden);
    }

    #[test]
    fn env_override_replaces_data_directory() {
        let config = BrowserConfig::default()
            .with_overrides(|key| (key == DATA_DIR_ENV).then(|| "/mnt/sdcard".to_string()));
        assert_eq!(config.data_directory, PathBuf::from("/mnt/sdcard"));

        let untouched = BrowserConfig::default().with_overrides(|_| Some("  ".to_string()));
        assert_eq!(untouched.data_directory, BrowserConfig::default().data_directory);
    }

    #[test]
    fn malformed_json_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = BrowserConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = BrowserConfig::load_or_default(&temp.path().join("absent.json")).unwrap();
        assert_eq!(config.new_file_extension, "txt");
    }
}
