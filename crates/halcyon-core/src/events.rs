use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::toast::ToastKind;

/// Every state change in the core produces an Event.
/// The GUI polls for events; the CLI prints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Persisted snapshot was read (or found absent) at mount.
    SnapshotRestored {
        had_value: bool,
        stale: bool,
        at: DateTime<Utc>,
    },
    /// A background revalidation was armed.
    RevalidationScheduled {
        due_in_ms: u64,
        at: DateTime<Utc>,
    },
    /// The revalidation delay elapsed; the fetch is now in flight.
    RevalidationStarted {
        at: DateTime<Utc>,
    },
    /// A fetch result replaced the current prediction.
    PredictionUpdated {
        id: String,
        generated_at_ms: u64,
        at: DateTime<Utc>,
    },
    /// The fetch failed; the cached value (if any) stays authoritative.
    RevalidationFailed {
        reason: String,
        at: DateTime<Utc>,
    },
    /// A toast was promoted to the visible slot.
    ToastShown {
        id: Uuid,
        message: String,
        kind: ToastKind,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// A toast was appended behind the active one.
    ToastQueued {
        id: Uuid,
        position: usize,
        at: DateTime<Utc>,
    },
    /// The active toast began its exit transition.
    ToastDismissed {
        id: Uuid,
        manual: bool,
        at: DateTime<Utc>,
    },
    /// The exit transition finished and the slot was freed.
    ToastClosed {
        id: Uuid,
        at: DateTime<Utc>,
    },
}
