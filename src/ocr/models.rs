//! OCR batch data types.
//!
//! All types serialize with camelCase field names.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Batch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrStatus {
    #[default]
    Idle,
    Initializing,
    Processing,
    Completed,
    Error,
    Cancelled,
}

impl OcrStatus {
    /// Terminal statuses end a batch's progress stream.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    /// Lowercase name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OcrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress snapshot, replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrProgress {
    pub status: OcrStatus,
    /// File being processed.
    pub current_image: Option<PathBuf>,
    /// Zero-based position of `current_image` in the batch.
    pub current_index: usize,
    pub total_images: usize,
    /// 0–100 within the current file.
    pub image_progress: u8,
    /// 0–100 across the batch.
    pub overall_progress: u8,
}

impl OcrProgress {
    /// Progress for a batch that has not started processing files.
    #[must_use]
    pub fn initializing(total_images: usize) -> Self {
        Self {
            status: OcrStatus::Initializing,
            total_images,
            ..Self::default()
        }
    }

    /// Progress at the start of file `index`.
    #[must_use]
    pub fn processing(index: usize, total_images: usize, path: PathBuf) -> Self {
        Self {
            status: OcrStatus::Processing,
            current_image: Some(path),
            current_index: index,
            total_images,
            image_progress: 0,
            overall_progress: overall_percent(index, total_images),
        }
    }

    /// Copy of this snapshot with new in-file progress.
    #[must_use]
    pub fn with_image_progress(&self, percent: u8) -> Self {
        Self {
            image_progress: percent.min(100),
            ..self.clone()
        }
    }

    /// Terminal snapshot after `processed` files; `current_index` points at
    /// the last file that was processed.
    #[must_use]
    pub fn finished(status: OcrStatus, processed: usize, total_images: usize) -> Self {
        let overall_progress = if status == OcrStatus::Completed {
            100
        } else {
            overall_percent(processed, total_images)
        };
        Self {
            status,
            current_image: None,
            current_index: processed.min(total_images).saturating_sub(1),
            total_images,
            image_progress: if status == OcrStatus::Completed { 100 } else { 0 },
            overall_progress,
        }
    }
}

/// `round(index / total * 100)`, 100 for an empty batch.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn overall_percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (index as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Outcome for one requested path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub path: PathBuf,
    pub text: String,
    /// 0–100.
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResult {
    /// Successful recognition.
    #[must_use]
    pub fn ok(path: PathBuf, text: String, confidence: f32) -> Self {
        Self {
            path,
            text,
            confidence: confidence.clamp(0.0, 100.0),
            error: None,
        }
    }

    /// Failed recognition; text and confidence are zeroed.
    #[must_use]
    pub fn failed(path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            path,
            text: String::new(),
            confidence: 0.0,
            error: Some(error.into()),
        }
    }

    /// Whether recognition failed for this path.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Final outcome of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    pub success: bool,
    /// In request order.
    pub results: Vec<OcrResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResponse {
    /// Successful (possibly partial) batch.
    #[must_use]
    pub const fn completed(results: Vec<OcrResult>) -> Self {
        Self {
            success: true,
            results,
            error: None,
        }
    }

    /// Batch aborted by an engine-level failure.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overall_percent() {
        assert_eq!(overall_percent(0, 5), 0);
        assert_eq!(overall_percent(1, 3), 33);
        assert_eq!(overall_percent(2, 3), 67);
        assert_eq!(overall_percent(1, 8), 13);
        assert_eq!(overall_percent(4, 4), 100);
        assert_eq!(overall_percent(0, 0), 100);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OcrStatus::Completed.is_terminal());
        assert!(OcrStatus::Error.is_terminal());
        assert!(OcrStatus::Cancelled.is_terminal());
        assert!(!OcrStatus::Idle.is_terminal());
        assert!(!OcrStatus::Initializing.is_terminal());
        assert!(!OcrStatus::Processing.is_terminal());
    }

    #[test]
    fn test_progress_json_shape() {
        let progress = OcrProgress::processing(1, 4, PathBuf::from("/p/b.png"));
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "processing",
                "currentImage": "/p/b.png",
                "currentIndex": 1,
                "totalImages": 4,
                "imageProgress": 0,
                "overallProgress": 25
            })
        );
    }

    #[test]
    fn test_finished_completed_is_full() {
        let done = OcrProgress::finished(OcrStatus::Completed, 3, 3);
        assert_eq!(done.overall_progress, 100);
        assert_eq!(done.image_progress, 100);
        assert_eq!(done.current_index, 2);
        assert!(done.current_image.is_none());
    }

    #[test]
    fn test_finished_cancelled_reflects_processed() {
        let cancelled = OcrProgress::finished(OcrStatus::Cancelled, 1, 5);
        assert_eq!(cancelled.overall_progress, 20);
        assert_eq!(cancelled.current_index, 0);
    }

    #[test]
    fn test_image_progress_is_clamped() {
        let progress = OcrProgress::processing(0, 1, PathBuf::from("/a.png"));
        assert_eq!(progress.with_image_progress(250).image_progress, 100);
    }

    #[test]
    fn test_result_error_omitted_when_absent() {
        let ok = OcrResult::ok(PathBuf::from("/a.png"), "hello".to_string(), 91.0);
        let value = serde_json::to_value(&ok).unwrap();
        assert!(value.get("error").is_none());

        let failed = OcrResult::failed(PathBuf::from("/b.png"), "corrupt");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["error"], "corrupt");
        assert_eq!(value["text"], "");
    }

    #[test]
    fn test_confidence_clamped() {
        let ok = OcrResult::ok(PathBuf::from("/a.png"), String::new(), 140.0);
        assert!((ok.confidence - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_response_constructors() {
        let done = OcrResponse::completed(vec![]);
        assert!(done.success);
        assert!(done.error.is_none());

        let failed = OcrResponse::failed("engine down");
        assert!(!failed.success);
        assert!(failed.results.is_empty());
        assert_eq!(failed.error.as_deref(), Some("engine down"));
    }
}
