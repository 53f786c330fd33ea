//! Error types and Result aliases for Pixelscribe.
//!
//! This module defines the error hierarchy used throughout the crate.
//! Scan failures never show up here: they degrade to partial listings
//! and are only logged.

use thiserror::Error;

/// Result type alias using Pixelscribe's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Pixelscribe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// OCR engine or batch error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Settings (de)serialization error.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The debounce thread could not be started.
    #[error("failed to spawn debounce thread: {0}")]
    Spawn(String),
}

/// OCR errors.
///
/// `EngineUnavailable` and `Engine` make a whole batch meaningless;
/// `File` only affects the image it names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// The engine could not be initialized.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Unrecoverable engine fault.
    #[error("OCR engine failure: {0}")]
    Engine(String),

    /// Recognition failed for a single file.
    #[error("failed to recognize '{path}': {reason}")]
    File { path: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl OcrError {
    /// Create a per-file error.
    pub fn file(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        Self::File {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the whole batch.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_) | Self::Engine(_))
    }
}

#[cfg(test)]
mod tests;
