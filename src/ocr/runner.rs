//! Batch OCR job runner.
//!
//! Runs one batch at a time. Files are processed sequentially on the
//! blocking pool; cancellation is checked between files, never mid-file.
//! Starting a batch cancels the one in flight and waits for it to end.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::engine::{OcrEngine, Recognition};
use super::models::{OcrProgress, OcrResponse, OcrResult, OcrStatus};
use crate::app::metrics;
use crate::error::OcrError;
use crate::hub::{EventHub, Subscription};

/// Token of the most recently requested batch, tagged with its sequence number.
type CurrentBatch = Arc<Mutex<Option<(u64, CancellationToken)>>>;

/// Requests cancellation of the current batch from any thread.
#[derive(Clone, Debug)]
pub struct Canceller {
    current: CurrentBatch,
}

impl Canceller {
    /// Ask the current batch to stop after its in-flight file.
    /// A no-op when nothing is running.
    pub fn cancel(&self) {
        if let Some((_, token)) = self.current.lock().as_ref() {
            token.cancel();
        }
    }
}

/// Publishes progress and remembers the latest snapshot.
#[derive(Clone)]
struct ProgressSink {
    hub: EventHub<OcrProgress>,
    latest: Arc<Mutex<OcrProgress>>,
}

impl ProgressSink {
    fn publish(&self, progress: OcrProgress) {
        *self.latest.lock() = progress.clone();
        self.hub.emit(&progress);
    }
}

/// Single-flight OCR batch executor.
pub struct OcrJobRunner {
    batches: Arc<Batches>,
}

/// State shared between the runner and the task executing each batch.
struct Batches {
    engine: Arc<dyn OcrEngine>,
    sink: ProgressSink,
    current: CurrentBatch,
    next_seq: AtomicU64,
    run_lock: tokio::sync::Mutex<()>,
}

impl OcrJobRunner {
    /// Create a runner over `engine`.
    #[must_use]
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            batches: Arc::new(Batches {
                engine,
                sink: ProgressSink {
                    hub: EventHub::new(),
                    latest: Arc::new(Mutex::new(OcrProgress::default())),
                },
                current: Arc::new(Mutex::new(None)),
                next_seq: AtomicU64::new(0),
                run_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Subscribe to progress snapshots.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_progress<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&OcrProgress) + Send + Sync + 'static,
    {
        self.batches.sink.hub.subscribe(callback)
    }

    /// Latest progress snapshot.
    #[must_use]
    pub fn progress(&self) -> OcrProgress {
        self.batches.sink.latest.lock().clone()
    }

    /// Whether a batch holds the runner.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.batches.run_lock.try_lock().is_err()
    }

    /// Handle for cancelling from another control flow.
    #[must_use]
    pub fn canceller(&self) -> Canceller {
        Canceller {
            current: Arc::clone(&self.batches.current),
        }
    }

    /// Cancel the current batch, if any.
    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    /// Run OCR over `paths`, returning one result per processed path in
    /// request order.
    ///
    /// Never fails: engine-level failures come back as
    /// `success == false`, per-file failures as results with `error` set,
    /// and cancellation as a successful response holding the results
    /// gathered so far.
    ///
    /// The batch runs on its own task. Dropping the returned future cancels
    /// it; the task still finishes the in-flight file and publishes the
    /// terminal status before the next batch may start.
    pub async fn run(&self, paths: Vec<PathBuf>) -> OcrResponse {
        let seq = self.batches.next_seq.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.batches.current.lock().replace((seq, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
        }

        let cancel_on_drop = token.clone().drop_guard();
        let span = tracing::info_span!(
            "ocr_batch",
            batch_id = %Uuid::new_v4(),
            total = paths.len()
        );

        let batches = Arc::clone(&self.batches);
        let task = tokio::spawn(
            async move {
                let response = {
                    let _guard = batches.run_lock.lock().await;
                    batches.execute(paths, &token).await
                };
                batches.release(seq);
                response
            }
            .instrument(span),
        );

        let response = task
            .await
            .unwrap_or_else(|e| OcrResponse::failed(format!("OCR batch task failed: {e}")));
        cancel_on_drop.disarm();
        response
    }
}

impl Batches {
    /// Forget the token of batch `seq` unless a newer batch replaced it.
    fn release(&self, seq: u64) {
        let mut current = self.current.lock();
        if matches!(current.as_ref(), Some((s, _)) if *s == seq) {
            *current = None;
        }
    }

    async fn execute(&self, paths: Vec<PathBuf>, token: &CancellationToken) -> OcrResponse {
        let total = paths.len();
        metrics::OCR_BATCH_ACTIVE.inc();
        tracing::info!("OCR batch started");

        self.sink.publish(OcrProgress::initializing(total));

        let response = if paths.is_empty() {
            self.finish(OcrProgress::finished(OcrStatus::Completed, 0, 0));
            OcrResponse::completed(Vec::new())
        } else if token.is_cancelled() {
            self.finish(OcrProgress::finished(OcrStatus::Cancelled, 0, total));
            OcrResponse::completed(Vec::new())
        } else {
            match self.warm_up().await {
                Ok(()) => self.process(paths, token).await,
                Err(e) => self.abort(&e, 0, total),
            }
        };

        metrics::OCR_BATCH_ACTIVE.dec();
        response
    }

    async fn warm_up(&self) -> Result<(), OcrError> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.prepare())
            .await
            .map_err(|e| OcrError::Engine(format!("engine warm-up task failed: {e}")))?
    }

    async fn process(&self, paths: Vec<PathBuf>, token: &CancellationToken) -> OcrResponse {
        let total = paths.len();
        let mut results = Vec::with_capacity(total);

        for (index, path) in paths.into_iter().enumerate() {
            if token.is_cancelled() {
                tracing::info!(processed = results.len(), "OCR batch cancelled");
                self.finish(OcrProgress::finished(
                    OcrStatus::Cancelled,
                    results.len(),
                    total,
                ));
                return OcrResponse::completed(results);
            }

            let base = OcrProgress::processing(index, total, path.clone());
            self.sink.publish(base.clone());

            match self.recognize(path.clone(), base).await {
                Ok(recognition) => {
                    metrics::OCR_FILES.with_label_values(&["ok"]).inc();
                    tracing::debug!(index, path = %path.display(), "Recognized image");
                    results.push(OcrResult::ok(
                        path,
                        recognition.text,
                        recognition.confidence,
                    ));
                }
                Err(e) if e.is_fatal() => return self.abort(&e, index, total),
                Err(e) => {
                    metrics::OCR_FILES.with_label_values(&["error"]).inc();
                    tracing::warn!(index, path = %path.display(), error = %e, "OCR failed for image");
                    results.push(OcrResult::failed(path, e.to_string()));
                }
            }
        }

        tracing::info!(
            processed = results.len(),
            failed = results.iter().filter(|r| r.is_error()).count(),
            "OCR batch completed"
        );
        self.finish(OcrProgress::finished(OcrStatus::Completed, total, total));
        OcrResponse::completed(results)
    }

    async fn recognize(&self, path: PathBuf, base: OcrProgress) -> Result<Recognition, OcrError> {
        let engine = Arc::clone(&self.engine);
        let sink = self.sink.clone();
        let task_path = path.clone();

        tokio::task::spawn_blocking(move || {
            engine.recognize(&task_path, &|percent| {
                sink.publish(base.with_image_progress(percent));
            })
        })
        .await
        .unwrap_or_else(|e| Err(OcrError::file(&path, format!("recognition task failed: {e}"))))
    }

    fn abort(&self, error: &OcrError, index: usize, total: usize) -> OcrResponse {
        tracing::error!(error = %error, index, "OCR batch failed");
        let mut progress = OcrProgress::finished(OcrStatus::Error, index, total);
        progress.current_index = index;
        self.finish(progress);
        OcrResponse::failed(error.to_string())
    }

    fn finish(&self, progress: OcrProgress) {
        metrics::OCR_BATCHES
            .with_label_values(&[progress.status.as_str()])
            .inc();
        self.sink.publish(progress);
    }
}

impl std::fmt::Debug for OcrJobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrJobRunner")
            .field("running", &self.is_running())
            .field("progress", &self.progress())
            .finish_non_exhaustive()
    }
}
