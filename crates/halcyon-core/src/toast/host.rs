//! Mount/unmount driver for the toast queue.
//!
//! Owns the queue behind a mutex and a single tokio task that ticks it.
//! The renderer polls `active`/`phase` for what to draw; callers anywhere
//! in the app reach `show`/`dismiss` through this handle. Dropping the
//! host aborts the tick task, clearing every pending timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use super::queue::{ToastPhase, ToastQueue};
use super::request::ToastRequest;
use crate::now_ms;
use crate::storage::ToastConfig;

/// Tick granularity for the queue's deadlines. Fine enough that the
/// 200 ms exit transition lands on time.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to the mounted toast queue.
pub struct ToastHost {
    queue: Arc<Mutex<ToastQueue>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ToastHost {
    pub fn mount(config: ToastConfig) -> Self {
        let queue = Arc::new(Mutex::new(ToastQueue::new(config)));
        let task = tokio::spawn(run(Arc::clone(&queue)));
        Self {
            queue,
            task: Some(task),
        }
    }

    /// Enqueue a plain info toast. Side effects only.
    pub fn show(&self, message: impl Into<String>) {
        self.show_request(ToastRequest::new(message));
    }

    /// Enqueue a fully specified request.
    pub fn show_request(&self, request: ToastRequest) {
        if let Ok(mut q) = self.queue.lock() {
            let event = q.show(request, now_ms());
            debug!(?event, "toast enqueued");
        }
    }

    /// Dismiss the active toast early. No-op when nothing is visible.
    pub fn dismiss(&self) {
        if let Ok(mut q) = self.queue.lock() {
            if let Some(event) = q.dismiss(now_ms()) {
                debug!(?event, "toast dismissed");
            }
        }
    }

    pub fn active(&self) -> Option<ToastRequest> {
        self.queue.lock().ok().and_then(|q| q.active().cloned())
    }

    pub fn phase(&self) -> ToastPhase {
        self.queue
            .lock()
            .map(|q| q.phase())
            .unwrap_or(ToastPhase::Idle)
    }

    pub fn pending_len(&self) -> usize {
        self.queue.lock().map(|q| q.pending_len()).unwrap_or(0)
    }

    /// Tear down the host, clearing all pending timers.
    pub fn unmount(mut self) {
        self.abort_task();
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ToastHost {
    fn drop(&mut self) {
        self.abort_task();
    }
}

async fn run(queue: Arc<Mutex<ToastQueue>>) {
    loop {
        tokio::time::sleep(TICK_INTERVAL).await;
        let events = match queue.lock() {
            Ok(mut q) => q.tick(now_ms()),
            Err(_) => Vec::new(),
        };
        for event in events {
            debug!(?event, "toast transition");
        }
    }
}
