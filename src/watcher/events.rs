//! Classification of raw file system events.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Component, Path, PathBuf};

use notify::{Event, EventKind};

use super::filter::{is_hidden, is_image_file};

/// Kind of change to an image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// An event that should make the listing stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Find the first image change carried by `event`, if any.
///
/// Only non-hidden image files at most one level below `root`, outside
/// hidden subfolders, qualify.
#[must_use]
pub fn qualifying_change(root: &Path, event: &Event) -> Option<ImageChange> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Added,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return None,
    };

    event
        .paths
        .iter()
        .find(|path| is_watched_image(root, path) && !(kind == ChangeKind::Added && path.is_dir()))
        .map(|path| ImageChange {
            kind,
            path: path.clone(),
        })
}

/// Check whether `path` is an image inside the watch boundary of `root`.
#[must_use]
pub fn is_watched_image(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };

    let names: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    match names.as_slice() {
        [file] => !is_hidden(file) && is_image_file(file),
        [dir, file] => !is_hidden(dir) && !is_hidden(file) && is_image_file(file),
        _ => false,
    }
}
