//! Persisted user settings (project folder and window geometry).
//!
//! The file is plain JSON. Fields missing from the file fall back to their
//! defaults, and an unreadable or corrupt file is treated as absent.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Saved window position and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 900,
            height: 670,
        }
    }
}

/// Contents of `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub window_bounds: WindowBounds,
    pub project_folder: Option<PathBuf>,
}

/// File-backed settings with an in-memory copy.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: Mutex<Settings>,
}

impl SettingsStore {
    /// Open the store at `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_settings(&path);
        Self {
            path,
            current: Mutex::new(current),
        }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, replacing the in-memory copy.
    pub fn load(&self) -> Settings {
        let settings = read_settings(&self.path);
        *self.current.lock() = settings.clone();
        settings
    }

    /// Current settings.
    #[must_use]
    pub fn get(&self) -> Settings {
        self.current.lock().clone()
    }

    /// Replace and persist the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or file cannot be written.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        *self.current.lock() = settings.clone();

        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// The persisted project folder, if any.
    #[must_use]
    pub fn project_folder(&self) -> Option<PathBuf> {
        self.current.lock().project_folder.clone()
    }

    /// Persist a new project folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    pub fn set_project_folder(&self, folder: Option<PathBuf>) -> Result<()> {
        let mut settings = self.get();
        settings.project_folder = folder;
        self.save(&settings)
    }

    /// Saved window bounds.
    #[must_use]
    pub fn window_bounds(&self) -> WindowBounds {
        self.current.lock().window_bounds
    }

    /// Persist new window bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    pub fn set_window_bounds(&self, bounds: WindowBounds) -> Result<()> {
        let mut settings = self.get();
        settings.window_bounds = bounds;
        self.save(&settings)
    }
}

fn read_settings(path: &Path) -> Settings {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable settings, using defaults");
            return Settings::default();
        }
    };

    serde_json::from_str(&data).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Corrupt settings, using defaults");
        Settings::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = SettingsStore::open(tmp.path().join("config.json"));

        assert_eq!(store.get(), Settings::default());
        assert_eq!(store.window_bounds().width, 900);
        assert_eq!(store.window_bounds().height, 670);
        assert!(store.project_folder().is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let store = SettingsStore::open(&path);
        store
            .set_project_folder(Some(PathBuf::from("/photos/2024")))
            .unwrap();

        let reopened = SettingsStore::open(&path);
        assert_eq!(
            reopened.project_folder(),
            Some(PathBuf::from("/photos/2024"))
        );
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "projectFolder": "/scans" }"#).unwrap();

        let store = SettingsStore::open(&path);
        assert_eq!(store.project_folder(), Some(PathBuf::from("/scans")));
        assert_eq!(store.window_bounds(), WindowBounds::default());
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = SettingsStore::open(&path);
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_window_bounds_roundtrip_keeps_folder() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let store = SettingsStore::open(&path);

        store
            .set_project_folder(Some(PathBuf::from("/scans")))
            .unwrap();
        let bounds = WindowBounds {
            x: 40,
            y: 60,
            width: 1280,
            height: 800,
        };
        store.set_window_bounds(bounds).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.window_bounds, bounds);
        assert_eq!(loaded.project_folder, Some(PathBuf::from("/scans")));
    }

    #[test]
    fn test_file_uses_camel_case_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let store = SettingsStore::open(&path);
        store
            .set_project_folder(Some(PathBuf::from("/scans")))
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"projectFolder\""));
        assert!(raw.contains("\"windowBounds\""));
    }
}
