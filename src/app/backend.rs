//! Backend facade for a presentation layer.
//!
//! Ties together the persisted settings, the folder watcher and the OCR
//! runner behind the handful of operations a UI needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, SettingsStore};
use crate::hub::{EventHub, Subscription};
use crate::ocr::{Canceller, OcrEngine, OcrJobRunner, OcrProgress, OcrResponse};
use crate::watcher::{self, FolderWatcher, ImageFile, WatcherConfig};
use crate::Result;

/// Native folder dialog, or anything standing in for one.
pub trait FolderPicker {
    /// Ask the user for a folder. `None` means the choice was cancelled.
    fn pick_folder(&self) -> Option<PathBuf>;
}

impl<F> FolderPicker for F
where
    F: Fn() -> Option<PathBuf>,
{
    fn pick_folder(&self) -> Option<PathBuf> {
        self()
    }
}

/// Everything the presentation layer talks to.
pub struct Backend {
    settings: SettingsStore,
    watcher: FolderWatcher,
    changes: EventHub<()>,
    ocr: OcrJobRunner,
}

impl Backend {
    /// Validate `config`, load persisted settings and resume watching the
    /// saved project folder, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid. A saved folder
    /// that can no longer be watched is only logged.
    pub fn open(config: &Config, engine: Arc<dyn OcrEngine>) -> Result<Self> {
        config.validate()?;

        let backend = Self {
            settings: SettingsStore::open(config.settings_path()),
            watcher: FolderWatcher::new(WatcherConfig {
                debounce: config.debounce(),
            }),
            changes: EventHub::new(),
            ocr: OcrJobRunner::new(engine),
        };

        if let Some(folder) = backend.settings.project_folder() {
            tracing::info!(path = %folder.display(), "Restoring project folder");
            backend.watch(&folder);
        }

        Ok(backend)
    }

    /// Persisted settings.
    #[must_use]
    pub const fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Currently selected project folder.
    #[must_use]
    pub fn project_folder(&self) -> Option<PathBuf> {
        self.settings.project_folder()
    }

    /// Let the user pick a new project folder.
    ///
    /// Returns `None`, changing nothing, when the picker is cancelled.
    pub fn select_project_folder(&self, picker: &dyn FolderPicker) -> Option<PathBuf> {
        let Some(folder) = picker.pick_folder() else {
            tracing::debug!("Folder selection cancelled");
            return None;
        };
        Some(self.set_project_folder(folder))
    }

    /// Make `folder` the project folder: persist it and move the watch to it.
    pub fn set_project_folder(&self, folder: impl Into<PathBuf>) -> PathBuf {
        let folder = folder.into();

        if let Err(e) = self.settings.set_project_folder(Some(folder.clone())) {
            tracing::warn!(path = %folder.display(), error = %e, "Failed to persist project folder");
        }
        self.watch(&folder);

        folder
    }

    /// Images in the project folder, newest first. Empty without a folder.
    #[must_use]
    pub fn scan_images(&self) -> Vec<ImageFile> {
        self.project_folder()
            .map_or_else(Vec::new, |folder| watcher::scan_images(&folder))
    }

    /// [`Self::scan_images`] on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan task panicked.
    pub async fn scan_images_async(&self) -> Result<Vec<ImageFile>> {
        match self.project_folder() {
            Some(folder) => watcher::scan_images_async(&folder).await,
            None => Ok(Vec::new()),
        }
    }

    /// Subscribe to "the image listing may be stale" notifications.
    ///
    /// The callback runs on the watcher thread.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_files_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.changes.subscribe(move |_: &()| callback())
    }

    /// Run OCR over `paths`. Any batch already running is cancelled first.
    pub async fn run_ocr(&self, paths: Vec<PathBuf>) -> OcrResponse {
        self.ocr.run(paths).await
    }

    /// Cancel the running OCR batch; a no-op when idle.
    pub fn cancel_ocr(&self) {
        self.ocr.cancel();
    }

    /// Handle that cancels OCR from another task or thread.
    #[must_use]
    pub fn ocr_canceller(&self) -> Canceller {
        self.ocr.canceller()
    }

    /// Subscribe to OCR progress snapshots.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_ocr_progress<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&OcrProgress) + Send + Sync + 'static,
    {
        self.ocr.on_progress(callback)
    }

    /// Latest OCR progress snapshot.
    #[must_use]
    pub fn ocr_progress(&self) -> OcrProgress {
        self.ocr.progress()
    }

    /// Whether the project folder is being watched.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watcher.is_active()
    }

    /// Stop watching and cancel any running batch.
    pub fn shutdown(&self) {
        self.watcher.stop();
        self.ocr.cancel();
        tracing::info!("Backend shut down");
    }

    fn watch(&self, folder: &Path) {
        let changes = self.changes.clone();
        if let Err(e) = self.watcher.start(folder, move || changes.emit(&())) {
            tracing::warn!(path = %folder.display(), error = %e, "Project folder is not being watched");
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("settings", &self.settings.path())
            .field("watcher", &self.watcher)
            .field("ocr", &self.ocr)
            .finish_non_exhaustive()
    }
}
