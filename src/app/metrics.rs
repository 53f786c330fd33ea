//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

use crate::{Error, Result};

/// Image files returned by scans.
pub static IMAGES_SCANNED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pixelscribe_images_scanned_total",
        "Total number of image files returned by folder scans"
    )
    .unwrap()
});

/// Entries that could not be read during scans.
pub static SCAN_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pixelscribe_scan_errors_total",
        "Total number of unreadable entries skipped by folder scans"
    )
    .unwrap()
});

/// Debounced change notifications delivered.
pub static CHANGE_NOTIFICATIONS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pixelscribe_change_notifications_total",
        "Total number of debounced file-change notifications"
    )
    .unwrap()
});

/// Files processed by OCR, by outcome.
pub static OCR_FILES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pixelscribe_ocr_files_total",
        "Total number of images processed by OCR",
        &["outcome"]
    )
    .unwrap()
});

/// Finished OCR batches, by terminal status.
pub static OCR_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pixelscribe_ocr_batches_total",
        "Total number of OCR batches by terminal status",
        &["status"]
    )
    .unwrap()
});

/// Whether an OCR batch currently holds the runner.
pub static OCR_BATCH_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "pixelscribe_ocr_batch_active",
        "Number of OCR batches currently processing"
    )
    .unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*IMAGES_SCANNED;
    let _ = &*SCAN_ERRORS;
    let _ = &*CHANGE_NOTIFICATIONS;
    let _ = &*OCR_FILES;
    let _ = &*OCR_BATCHES;
    let _ = &*OCR_BATCH_ACTIVE;

    tracing::debug!("Prometheus metrics initialized");
}

/// Render every registered metric in the text exposition format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| Error::internal(format!("failed to encode metrics: {e}")))?;
    String::from_utf8(buffer).map_err(|e| Error::internal(format!("metrics are not UTF-8: {e}")))
}
