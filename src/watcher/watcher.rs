//! Project folder watcher using notify-rs.
//!
//! Watches the root and its immediate subfolders (non-recursively each) and
//! reports "the listing may be stale" once per burst of image changes.

#![allow(clippy::used_underscore_binding)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{at, bounded, never, select, unbounded, Receiver, Sender};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::events::{is_watched_image, qualifying_change};
use super::filter::is_hidden;
use crate::app::metrics;
use crate::error::WatcherError;
use crate::Result;

/// Default quiet period before a change burst is reported.
const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

/// A continuous stream of changes is still reported at least this often,
/// as a multiple of the debounce window.
const MAX_WAIT_FACTOR: u32 = 10;

type RawEvent = notify::Result<Event>;

/// Folder watcher configuration.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration.
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_DURATION,
        }
    }
}

/// Watches at most one project folder at a time.
pub struct FolderWatcher {
    config: WatcherConfig,
    /// Serializes start/stop; never taken by `on_changed`.
    switch: Mutex<()>,
    active: Mutex<Option<ActiveWatch>>,
}

/// A running watch: the OS watcher handle plus its debounce thread.
struct ActiveWatch {
    root: PathBuf,
    _watcher: Arc<Mutex<RecommendedWatcher>>,
    shutdown_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl FolderWatcher {
    /// Create an idle watcher.
    #[must_use]
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            switch: Mutex::new(()),
            active: Mutex::new(None),
        }
    }

    /// Start watching `root`, replacing any previous watch.
    ///
    /// The previous watch is fully torn down before the new one is set up,
    /// so callbacks for the old root never fire after this returns.
    /// `on_changed` runs on the watcher's own thread. It may query this
    /// watcher, but must not wait on another thread that is re-targeting it.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be watched. The watcher is then
    /// left idle.
    pub fn start<F>(&self, root: impl AsRef<Path>, on_changed: F) -> Result<()>
    where
        F: Fn() + Send + 'static,
    {
        let _switch = self.switch.lock();
        self.tear_down();

        let watch = ActiveWatch::spawn(root.as_ref(), self.config.debounce, Box::new(on_changed))?;
        tracing::info!(path = %watch.root.display(), "Watching folder");
        *self.active.lock() = Some(watch);
        Ok(())
    }

    /// Stop the current watch, if any.
    pub fn stop(&self) {
        let _switch = self.switch.lock();
        self.tear_down();
    }

    /// Take the current watch out and join its thread outside the `active`
    /// lock, so a callback still running can read the watcher state.
    fn tear_down(&self) {
        let previous = self.active.lock().take();
        if let Some(previous) = previous {
            tracing::info!(path = %previous.root.display(), "Stopped watching folder");
            drop(previous);
        }
    }

    /// Root of the current watch.
    #[must_use]
    pub fn root(&self) -> Option<PathBuf> {
        self.active.lock().as_ref().map(|w| w.root.clone())
    }

    /// Whether a watch is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }
}

impl Default for FolderWatcher {
    fn default() -> Self {
        Self::new(WatcherConfig::default())
    }
}

impl std::fmt::Debug for FolderWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderWatcher")
            .field("config", &self.config)
            .field("root", &self.root())
            .finish()
    }
}

impl ActiveWatch {
    fn spawn(root: &Path, debounce: Duration, on_changed: Box<dyn Fn() + Send>) -> Result<Self> {
        let watch_failed = |reason: String| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason,
        };

        let root = root
            .canonicalize()
            .map_err(|e| watch_failed(e.to_string()))?;
        if !root.is_dir() {
            return Err(watch_failed("not a directory".to_string()).into());
        }

        let (event_tx, event_rx) = unbounded::<RawEvent>();
        let mut watcher = notify::recommended_watcher(move |res: RawEvent| {
            let _ = event_tx.send(res);
        })
        .map_err(|e| watch_failed(e.to_string()))?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| watch_failed(e.to_string()))?;

        for dir in subfolders(&root) {
            if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                tracing::warn!(path = %dir.display(), error = %e, "Cannot watch subfolder");
            }
        }

        let watcher = Arc::new(Mutex::new(watcher));
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let debouncer = Debouncer {
            root: root.clone(),
            debounce,
            watcher: Arc::clone(&watcher),
            on_changed,
        };

        let worker = thread::Builder::new()
            .name("folder-watch".to_string())
            .spawn(move || debouncer.run(event_rx, shutdown_rx))
            .map_err(|e| WatcherError::Spawn(e.to_string()))?;

        Ok(Self {
            root,
            _watcher: watcher,
            shutdown_tx,
            worker: Some(worker),
        })
    }
}

impl Drop for ActiveWatch {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());

        if let Some(worker) = self.worker.take() {
            // Stopped from inside `on_changed`; the thread exits on its own.
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                tracing::error!(path = %self.root.display(), "Folder watch thread panicked");
            }
        }
    }
}

/// Trailing-edge debounce over raw events.
struct Debouncer {
    root: PathBuf,
    debounce: Duration,
    watcher: Arc<Mutex<RecommendedWatcher>>,
    on_changed: Box<dyn Fn() + Send>,
}

impl Debouncer {
    #[allow(clippy::needless_pass_by_value)]
    fn run(&self, event_rx: Receiver<RawEvent>, shutdown_rx: Receiver<()>) {
        let max_wait = self.debounce * MAX_WAIT_FACTOR;
        let mut first_pending: Option<Instant> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            let timer = deadline.map_or_else(never, at);

            select! {
                recv(shutdown_rx) -> _ => return,
                recv(event_rx) -> msg => {
                    let Ok(res) = msg else { return };
                    match res {
                        Ok(event) => {
                            if self.is_relevant(&event) {
                                let now = Instant::now();
                                let first = *first_pending.get_or_insert(now);
                                deadline = Some((now + self.debounce).min(first + max_wait));
                            }
                        }
                        Err(e) => tracing::warn!(path = %self.root.display(), error = %e, "Watch error"),
                    }
                },
                recv(timer) -> _ => {
                    first_pending = None;
                    deadline = None;
                    metrics::CHANGE_NOTIFICATIONS.inc();
                    tracing::debug!(path = %self.root.display(), "Image files changed");
                    (self.on_changed)();
                },
            }
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if let Some(change) = qualifying_change(&self.root, event) {
            tracing::trace!(kind = ?change.kind, path = %change.path.display(), "Image change");
            return true;
        }

        // A new subfolder, created or moved in, gets its own watch; images
        // arriving with it count as a change since they produce no events
        // of their own.
        let mut adopted_images = false;
        if matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
        ) {
            for path in &event.paths {
                if is_new_subfolder(&self.root, path) {
                    adopted_images |= self.adopt_subfolder(path);
                }
            }
        }
        adopted_images
    }

    fn adopt_subfolder(&self, dir: &Path) -> bool {
        if let Err(e) = self.watcher.lock().watch(dir, RecursiveMode::NonRecursive) {
            tracing::warn!(path = %dir.display(), error = %e, "Cannot watch new subfolder");
            return false;
        }
        tracing::debug!(path = %dir.display(), "Watching new subfolder");

        fs::read_dir(dir).is_ok_and(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
                .any(|e| is_watched_image(&self.root, &e.path()))
        })
    }
}

/// Non-hidden directories directly under `root`.
fn subfolders(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };

    entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|e| !e.file_name().to_str().is_some_and(is_hidden))
        .map(|e| e.path())
        .collect()
}

fn is_new_subfolder(root: &Path, path: &Path) -> bool {
    path.parent() == Some(root)
        && path.is_dir()
        && !path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.debounce, DEBOUNCE_DURATION);
    }

    #[test]
    fn test_watcher_nonexistent_dir() {
        let watcher = FolderWatcher::default();
        let (_, cb) = counter();

        let result = watcher.start("/nonexistent/directory", cb);
        assert!(result.is_err());
        assert!(!watcher.is_active());
    }

    #[test]
    fn test_watcher_rejects_file_root() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.png");
        fs::write(&file, b"x").unwrap();

        let watcher = FolderWatcher::default();
        let (_, cb) = counter();
        assert!(watcher.start(&file, cb).is_err());
    }

    #[test]
    fn test_watcher_start_and_stop() {
        let tmp = TempDir::new().unwrap();
        let watcher = FolderWatcher::default();
        let (_, cb) = counter();

        watcher.start(tmp.path(), cb).unwrap();
        assert!(watcher.is_active());
        assert_eq!(watcher.root(), Some(tmp.path().canonicalize().unwrap()));

        watcher.stop();
        assert!(!watcher.is_active());
        assert!(watcher.root().is_none());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let watcher = FolderWatcher::default();
        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_active());
    }

    #[test]
    fn test_no_notification_after_stop() {
        let tmp = TempDir::new().unwrap();
        let watcher = FolderWatcher::default();
        let (count, cb) = counter();

        watcher.start(tmp.path(), cb).unwrap();
        watcher.stop();

        fs::write(tmp.path().join("late.png"), b"x").unwrap();
        thread::sleep(Duration::from_millis(400));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subfolders_skip_hidden() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("trip")).unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join("file.png"), b"x").unwrap();

        let dirs = subfolders(tmp.path());
        assert_eq!(dirs, vec![tmp.path().join("trip")]);
    }
}
