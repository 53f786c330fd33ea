//! Project folder scanning and watching.
//!
//! This module provides:
//! - Image file classification by extension
//! - A one-level-deep directory scanner producing [`ImageFile`] listings
//! - A debounced folder watcher using notify-rs

mod events;
mod filter;
mod scanner;
#[allow(clippy::module_inception)]
mod watcher;

pub use events::{is_watched_image, qualifying_change, ChangeKind, ImageChange};
pub use filter::{is_hidden, is_image_file};
pub use scanner::{scan_images, scan_images_async, scan_images_with_stats, ImageFile, ScanStats};
pub use watcher::{FolderWatcher, WatcherConfig};
