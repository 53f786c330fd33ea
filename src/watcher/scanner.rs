//! Directory scanner producing the image listing.
//!
//! Looks at the root folder and one level of non-hidden subfolders.
//! Unreadable directories are skipped, never reported as errors.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use super::filter::{is_hidden, is_image_file};
use crate::app::metrics;
use crate::Result;

/// Snapshot of one image file at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    /// Absolute path; unique within a scan.
    pub path: PathBuf,
    /// Base file name.
    pub name: String,
    /// Last modification time, epoch milliseconds.
    pub modified_at: i64,
    /// Name of the subfolder containing the file, `None` at the root.
    pub folder: Option<String>,
}

/// Scan counters, logged once per scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    pub files_found: u64,
    pub files_skipped: u64,
    pub errors: u64,
}

/// Scan `root` for image files, newest first.
///
/// Never fails: an unreadable root yields an empty listing and an
/// unreadable subfolder is left out of it.
#[must_use]
pub fn scan_images(root: &Path) -> Vec<ImageFile> {
    scan_images_with_stats(root).0
}

/// Same as [`scan_images`], also returning the scan counters.
#[must_use]
pub fn scan_images_with_stats(root: &Path) -> (Vec<ImageFile>, ScanStats) {
    let mut stats = ScanStats::default();

    let root = match root.canonicalize() {
        Ok(root) => root,
        Err(e) => {
            tracing::warn!(path = %root.display(), error = %e, "Cannot read scan root");
            stats.errors += 1;
            metrics::SCAN_ERRORS.inc();
            return (Vec::new(), stats);
        }
    };

    tracing::debug!(path = %root.display(), "Starting image scan");

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden_entry(entry));

    let mut images = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Error reading directory during scan");
                stats.errors += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        stats.files_found += 1;

        if !is_image_file(entry.file_name()) {
            stats.files_skipped += 1;
            continue;
        }

        match image_from_entry(&entry) {
            Some(image) => images.push(image),
            None => stats.errors += 1,
        }
    }

    // Stable sort keeps discovery (file name) order among equal timestamps.
    images.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    metrics::IMAGES_SCANNED.inc_by(images.len() as u64);
    metrics::SCAN_ERRORS.inc_by(stats.errors);

    tracing::info!(
        path = %root.display(),
        images = images.len(),
        found = stats.files_found,
        skipped = stats.files_skipped,
        errors = stats.errors,
        "Image scan complete"
    );

    (images, stats)
}

/// Async version of [`scan_images`], run on the blocking pool.
///
/// # Errors
///
/// Returns an error only if the blocking task itself fails.
pub async fn scan_images_async(root: &Path) -> Result<Vec<ImageFile>> {
    let root = root.to_path_buf();

    tokio::task::spawn_blocking(move || scan_images(&root))
        .await
        .map_err(|e| crate::Error::internal(format!("Scan task failed: {e}")))
}

/// Hidden files are skipped and hidden subfolders are not descended into.
fn is_hidden_entry(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(is_hidden)
}

fn image_from_entry(entry: &DirEntry) -> Option<ImageFile> {
    let modified = match entry
        .metadata()
        .map_err(|e| e.to_string())
        .and_then(|m| m.modified().map_err(|e| e.to_string()))
    {
        Ok(modified) => modified,
        Err(e) => {
            tracing::warn!(path = %entry.path().display(), error = %e, "Cannot read file metadata");
            return None;
        }
    };

    let folder = if entry.depth() == 2 {
        entry
            .path()
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    } else {
        None
    };

    Some(ImageFile {
        path: entry.path().to_path_buf(),
        name: entry.file_name().to_string_lossy().into_owned(),
        modified_at: DateTime::<Utc>::from(modified).timestamp_millis(),
        folder,
    })
}
