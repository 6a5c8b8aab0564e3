//! Mount/unmount driver for the prediction cache.
//!
//! The cache itself is a caller-ticked state machine with no internal
//! timers; this module owns the tokio task that does the ticking, the
//! persisted-store I/O, and the remote fetch. One provider is constructed
//! at application-root mount and torn down at unmount, which aborts the
//! task and with it every outstanding wait.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use super::cache::PredictionCache;
use super::model::{Prediction, PredictionSnapshot};
use super::source::PredictionSource;
use crate::error::CoreError;
use crate::events::Event;
use crate::now_ms;
use crate::storage::PredictionConfig;
use crate::storage::store::{SnapshotStore, PREDICTION_STATE_KEY};

/// Receives non-fatal failures (fetch errors, mostly). Optional: the
/// provider checks for presence before use instead of catching a missing
/// collaborator as control flow.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &CoreError);
}

/// How often the driver task ticks the state machine. Coarse enough to be
/// cheap, fine enough that the 400 ms revalidation delay lands on time.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to the mounted prediction cache.
///
/// Consumers read `current`/`loading` and never trigger fetches
/// themselves; revalidation happens automatically.
pub struct PredictionProvider {
    cache: Arc<Mutex<PredictionCache>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl PredictionProvider {
    /// Mount the provider: restore the persisted snapshot, evaluate
    /// staleness, and start the background tick task.
    pub fn mount(
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn PredictionSource>,
        reporter: Option<Arc<dyn ErrorReporter>>,
        config: PredictionConfig,
    ) -> Self {
        let cache = Arc::new(Mutex::new(PredictionCache::new(config)));
        let task = tokio::spawn(run(Arc::clone(&cache), store, source, reporter));
        Self {
            cache,
            task: Some(task),
        }
    }

    pub fn current(&self) -> Option<Prediction> {
        self.cache
            .lock()
            .ok()
            .and_then(|c| c.current().cloned())
    }

    pub fn loading(&self) -> bool {
        self.cache.lock().map(|c| c.loading()).unwrap_or(false)
    }

    pub fn history(&self) -> Vec<Prediction> {
        self.cache
            .lock()
            .map(|c| c.history().to_vec())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<PredictionSnapshot> {
        self.cache.lock().ok().map(|c| c.snapshot())
    }

    /// Tear down the provider, clearing all pending timers.
    pub fn unmount(mut self) {
        self.abort_task();
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PredictionProvider {
    fn drop(&mut self) {
        self.abort_task();
    }
}

async fn run(
    cache: Arc<Mutex<PredictionCache>>,
    store: Arc<dyn SnapshotStore>,
    source: Arc<dyn PredictionSource>,
    reporter: Option<Arc<dyn ErrorReporter>>,
) {
    // Restore once; any concurrent mount coalesces inside the machine.
    let should_read = cache
        .lock()
        .map(|mut c| c.begin_restore())
        .unwrap_or(false);
    if should_read {
        let snapshot = read_snapshot(&store).await;
        if let Ok(mut c) = cache.lock() {
            for event in c.finish_restore(snapshot, now_ms()) {
                debug!(?event, "prediction cache restored");
            }
            if let Some(event) = c.schedule_revalidation(now_ms()) {
                debug!(?event, "revalidation scheduled");
            }
        }
    }

    loop {
        tokio::time::sleep(TICK_INTERVAL).await;
        let now = now_ms();
        let mut fetch_due = false;
        if let Ok(mut c) = cache.lock() {
            // Idempotent; lets a long-lived mount revalidate when the TTL
            // lapses, not just at startup.
            if let Some(event) = c.schedule_revalidation(now) {
                debug!(?event, "revalidation scheduled");
            }
            if let Some(Event::RevalidationStarted { .. }) = c.tick(now) {
                fetch_due = true;
            }
        }
        if fetch_due {
            run_fetch(&cache, &store, &source, reporter.as_deref()).await;
        }
    }
}

async fn read_snapshot(store: &Arc<dyn SnapshotStore>) -> Option<PredictionSnapshot> {
    let store = Arc::clone(store);
    let raw = match tokio::task::spawn_blocking(move || store.read(PREDICTION_STATE_KEY)).await {
        Ok(Ok(Some(raw))) => raw,
        Ok(Ok(None)) => return None,
        Ok(Err(e)) => {
            warn!("snapshot read failed, treating as cold start: {e}");
            return None;
        }
        Err(e) => {
            warn!("snapshot read task failed: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("snapshot decode failed, treating as cold start: {e}");
            None
        }
    }
}

async fn run_fetch(
    cache: &Arc<Mutex<PredictionCache>>,
    store: &Arc<dyn SnapshotStore>,
    source: &Arc<dyn PredictionSource>,
    reporter: Option<&dyn ErrorReporter>,
) {
    let source = Arc::clone(source);
    match tokio::task::spawn_blocking(move || source.fetch_latest()).await {
        Ok(Ok(prediction)) => {
            let snapshot = match cache.lock() {
                Ok(mut c) => {
                    let event = c.apply_fetch_success(prediction, now_ms());
                    debug!(?event, "prediction updated");
                    Some(c.snapshot())
                }
                Err(_) => None,
            };
            if let Some(snapshot) = snapshot {
                persist_snapshot(store, snapshot);
            }
        }
        Ok(Err(e)) => report_failure(cache, reporter, CoreError::Fetch(e)),
        Err(e) => report_failure(
            cache,
            reporter,
            CoreError::Custom(format!("fetch task failed: {e}")),
        ),
    }
}

fn report_failure(
    cache: &Arc<Mutex<PredictionCache>>,
    reporter: Option<&dyn ErrorReporter>,
    error: CoreError,
) {
    if let Ok(mut c) = cache.lock() {
        let event = c.apply_fetch_failure(&error.to_string());
        debug!(?event, "revalidation failed");
    }
    warn!("prediction fetch failed: {error}");
    if let Some(reporter) = reporter {
        reporter.report(&error);
    }
}

/// Fire-and-forget write. Failure is logged; the in-memory state never
/// blocks on it.
fn persist_snapshot(store: &Arc<dyn SnapshotStore>, snapshot: PredictionSnapshot) {
    let store = Arc::clone(store);
    let _ = tokio::task::spawn_blocking(move || {
        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("snapshot serialize failed: {e}");
                return;
            }
        };
        if let Err(e) = store.write(PREDICTION_STATE_KEY, &raw) {
            warn!("snapshot write failed, keeping in-memory value: {e}");
        }
    });
}
