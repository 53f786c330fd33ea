//! Batch text recognition over image files.
//!
//! This module provides:
//! - Progress, result and response types for OCR batches
//! - The [`OcrEngine`] seam with a tesseract backend behind the `tesseract` feature
//! - A cancellable, single-flight [`OcrJobRunner`]

mod engine;
mod models;
mod runner;

#[cfg(feature = "tesseract")]
pub use engine::TesseractEngine;
pub use engine::{default_engine, OcrEngine, Recognition, TesseractConfig, UnavailableEngine};
pub use models::{overall_percent, OcrProgress, OcrResponse, OcrResult, OcrStatus};
pub use runner::{Canceller, OcrJobRunner};
