//! Staleness-aware prediction cache.
//!
//! The cache is a wall-clock-based state machine. It does not use internal
//! threads or timers - every operation takes `now_ms` and the caller (the
//! provider task, a GUI poll loop, or a test) is responsible for calling
//! `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Uninitialized -> Restoring -> Ready
//! ```
//!
//! Within `Ready`, revalidation runs through its own one-shot cycle:
//! stale -> delay armed -> fetch in flight -> updated (or failed).
//! At most one revalidation is in flight at any time; scheduling while one
//! is armed or in flight is a no-op.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::model::{Prediction, PredictionSnapshot};
use crate::events::Event;
use crate::storage::PredictionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Uninitialized,
    Restoring,
    Ready,
}

/// Core prediction cache.
///
/// Owns the single current value and its acceptance timestamp, and
/// guarantees the value is never older than the TTL without a revalidation
/// having been scheduled.
#[derive(Debug, Clone)]
pub struct PredictionCache {
    config: PredictionConfig,
    state: CacheState,
    current: Option<Prediction>,
    /// When `current` was last accepted (epoch milliseconds).
    last_updated_ms: Option<u64>,
    history: Vec<Prediction>,
    loading: bool,
    /// Armed one-shot revalidation delay (epoch milliseconds).
    fetch_due_at_ms: Option<u64>,
    fetch_in_flight: bool,
    /// A schedule request arrived before the snapshot was known.
    deferred_schedule: bool,
    /// Opaque snapshot fields owned by other parts of the app.
    extra: serde_json::Map<String, serde_json::Value>,
}

impl PredictionCache {
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            config,
            state: CacheState::Uninitialized,
            current: None,
            last_updated_ms: None,
            history: Vec::new(),
            loading: false,
            fetch_due_at_ms: None,
            fetch_in_flight: false,
            deferred_schedule: false,
            extra: serde_json::Map::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn current(&self) -> Option<&Prediction> {
        self.current.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn history(&self) -> &[Prediction] {
        &self.history
    }

    pub fn last_updated_ms(&self) -> Option<u64> {
        self.last_updated_ms
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    /// True iff no value has ever been accepted, or the current one is
    /// older than the TTL. Pure; no side effects.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        match self.last_updated_ms {
            None => true,
            Some(ts) => now_ms.saturating_sub(ts) > self.config.ttl_ms,
        }
    }

    /// Build the persisted form of the in-memory state.
    pub fn snapshot(&self) -> PredictionSnapshot {
        PredictionSnapshot {
            current: self.current.clone(),
            last_updated_ms: self.last_updated_ms,
            history: self.history.clone(),
            was_loading: self.loading,
            extra: self.extra.clone(),
        }
    }

    // ── Restore ──────────────────────────────────────────────────────

    /// Claim the restore. Returns true for the caller that should perform
    /// the persisted read; any concurrent or repeated mount gets false and
    /// reuses the outcome of the first (request coalescing).
    pub fn begin_restore(&mut self) -> bool {
        match self.state {
            CacheState::Uninitialized => {
                self.state = CacheState::Restoring;
                true
            }
            CacheState::Restoring | CacheState::Ready => false,
        }
    }

    /// Install the persisted snapshot (or none, on read failure / cold
    /// start) and replay any schedule request that arrived while the read
    /// was outstanding, so staleness is always judged against real data.
    pub fn finish_restore(
        &mut self,
        snapshot: Option<PredictionSnapshot>,
        now_ms: u64,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        if self.state == CacheState::Ready {
            return events; // Duplicate completion; first outcome wins.
        }
        if let Some(snap) = snapshot {
            self.current = snap.current;
            self.last_updated_ms = snap.last_updated_ms;
            self.history = snap.history;
            self.extra = snap.extra;
        }
        self.state = CacheState::Ready;
        events.push(Event::SnapshotRestored {
            had_value: self.current.is_some(),
            stale: self.is_stale(now_ms),
            at: Utc::now(),
        });
        if self.deferred_schedule {
            self.deferred_schedule = false;
            if let Some(ev) = self.schedule_revalidation(now_ms) {
                events.push(ev);
            }
        }
        events
    }

    // ── Revalidation ─────────────────────────────────────────────────

    /// Arm the one-shot revalidation delay if the value is stale.
    ///
    /// Idempotent: while a delay is armed or a fetch is in flight, further
    /// calls are no-ops. Before the restore resolves, the request is
    /// deferred and replayed by `finish_restore`.
    pub fn schedule_revalidation(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != CacheState::Ready {
            self.deferred_schedule = true;
            return None;
        }
        if !self.is_stale(now_ms) {
            return None;
        }
        if self.fetch_in_flight || self.fetch_due_at_ms.is_some() {
            return None;
        }
        let due_in_ms = self.config.revalidate_delay_ms;
        self.fetch_due_at_ms = Some(now_ms + due_in_ms);
        if self.current.is_none() {
            self.loading = true;
        }
        Some(Event::RevalidationScheduled {
            due_in_ms,
            at: Utc::now(),
        })
    }

    /// Call periodically. Returns `Some(Event::RevalidationStarted)` once
    /// the armed delay elapses; the caller then performs the fetch and
    /// reports back through `apply_fetch_success` / `apply_fetch_failure`.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        match self.fetch_due_at_ms {
            Some(due) if now_ms >= due => {
                self.fetch_due_at_ms = None;
                self.fetch_in_flight = true;
                Some(Event::RevalidationStarted { at: Utc::now() })
            }
            _ => None,
        }
    }

    /// Replace the current value with a fetch result. The previous value
    /// moves into bounded history; `last_updated` becomes `now`.
    pub fn apply_fetch_success(&mut self, prediction: Prediction, now_ms: u64) -> Event {
        self.fetch_in_flight = false;
        self.loading = false;
        if let Some(previous) = self.current.take() {
            self.history.insert(0, previous);
            self.history.truncate(self.config.history_limit);
        }
        let event = Event::PredictionUpdated {
            id: prediction.id.clone(),
            generated_at_ms: prediction.generated_at_ms,
            at: Utc::now(),
        };
        self.current = Some(prediction);
        self.last_updated_ms = Some(now_ms);
        event
    }

    /// Record a fetch failure. The cached value, if any, stays
    /// authoritative (stale-but-available); nothing is thrown to readers.
    pub fn apply_fetch_failure(&mut self, reason: &str) -> Event {
        self.fetch_in_flight = false;
        self.loading = false;
        Event::RevalidationFailed {
            reason: reason.to_string(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: u64 = 3 * 60 * 60 * 1000;
    const DELAY: u64 = 400;

    fn cache() -> PredictionCache {
        PredictionCache::new(PredictionConfig::default())
    }

    fn prediction(id: &str) -> Prediction {
        Prediction {
            id: id.into(),
            generated_at_ms: 1_000,
            score: 0.5,
            label: "steady".into(),
            confidence: 0.8,
            factors: vec![],
        }
    }

    fn restored_with(last_updated_ms: Option<u64>, now_ms: u64) -> PredictionCache {
        let mut c = cache();
        assert!(c.begin_restore());
        let snap = PredictionSnapshot {
            current: last_updated_ms.map(|_| prediction("persisted")),
            last_updated_ms,
            ..Default::default()
        };
        c.finish_restore(Some(snap), now_ms);
        c
    }

    #[test]
    fn begin_restore_coalesces() {
        let mut c = cache();
        assert!(c.begin_restore());
        assert!(!c.begin_restore());
        assert_eq!(c.state(), CacheState::Restoring);
    }

    #[test]
    fn staleness_boundary() {
        let now = 10 * TTL;
        let fresh = restored_with(Some(now - TTL + 1), now);
        assert!(!fresh.is_stale(now));
        let stale = restored_with(Some(now - TTL - 1), now);
        assert!(stale.is_stale(now));
        // Exactly at the TTL is still fresh (strictly-older-than).
        let edge = restored_with(Some(now - TTL), now);
        assert!(!edge.is_stale(now));
    }

    #[test]
    fn no_snapshot_counts_as_stale() {
        let mut c = cache();
        c.begin_restore();
        c.finish_restore(None, 5_000);
        assert!(c.is_stale(5_000));
        assert!(c.current().is_none());
    }

    #[test]
    fn schedule_noop_when_fresh() {
        let now = 10 * TTL;
        let mut c = restored_with(Some(now - 60_000), now);
        assert!(c.schedule_revalidation(now).is_none());
        assert!(c.tick(now + DELAY).is_none());
    }

    #[test]
    fn schedule_arms_delay_when_stale() {
        let now = 10 * TTL;
        let mut c = restored_with(Some(now - TTL - 60_000), now);
        assert!(matches!(
            c.schedule_revalidation(now),
            Some(Event::RevalidationScheduled { due_in_ms: DELAY, .. })
        ));
        // Not due yet.
        assert!(c.tick(now + DELAY - 1).is_none());
        assert!(matches!(
            c.tick(now + DELAY),
            Some(Event::RevalidationStarted { .. })
        ));
        assert!(c.fetch_in_flight());
    }

    #[test]
    fn schedule_is_idempotent_within_window() {
        let now = 10 * TTL;
        let mut c = restored_with(None, now);
        assert!(c.schedule_revalidation(now).is_some());
        assert!(c.schedule_revalidation(now + 100).is_none());
        assert!(c.tick(now + DELAY).is_some());
        // Still deduplicated while the fetch is in flight.
        assert!(c.schedule_revalidation(now + DELAY + 1).is_none());
        assert!(c.tick(now + 2 * DELAY).is_none());
    }

    #[test]
    fn schedule_before_restore_is_deferred() {
        let mut c = cache();
        assert!(c.schedule_revalidation(1_000).is_none());
        c.begin_restore();
        let events = c.finish_restore(None, 2_000);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::RevalidationScheduled { .. })));
        assert!(c.tick(2_000 + DELAY).is_some());
    }

    #[test]
    fn deferred_schedule_respects_fresh_snapshot() {
        let mut c = cache();
        c.schedule_revalidation(1_000);
        c.begin_restore();
        let now = 10 * TTL;
        let snap = PredictionSnapshot {
            current: Some(prediction("fresh")),
            last_updated_ms: Some(now - 60_000),
            ..Default::default()
        };
        let events = c.finish_restore(Some(snap), now);
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::RevalidationScheduled { .. })));
    }

    #[test]
    fn loading_only_without_value() {
        let now = 10 * TTL;
        let mut empty = restored_with(None, now);
        empty.schedule_revalidation(now);
        assert!(empty.loading());

        let mut stale = restored_with(Some(now - TTL - 1), now);
        stale.schedule_revalidation(now);
        assert!(!stale.loading());
    }

    #[test]
    fn fetch_success_replaces_and_keeps_history() {
        let now = 10 * TTL;
        let mut c = restored_with(Some(now - TTL - 1), now);
        c.schedule_revalidation(now);
        c.tick(now + DELAY);
        let event = c.apply_fetch_success(prediction("new"), now + DELAY + 10);
        assert!(matches!(event, Event::PredictionUpdated { .. }));
        assert_eq!(c.current().map(|p| p.id.as_str()), Some("new"));
        assert_eq!(c.last_updated_ms(), Some(now + DELAY + 10));
        assert_eq!(c.history().first().map(|p| p.id.as_str()), Some("persisted"));
        assert!(!c.loading());
        assert!(!c.fetch_in_flight());
    }

    #[test]
    fn fetch_failure_keeps_stale_value() {
        let now = 10 * TTL;
        let mut c = restored_with(Some(now - TTL - 1), now);
        c.schedule_revalidation(now);
        c.tick(now + DELAY);
        let event = c.apply_fetch_failure("network unreachable");
        assert!(matches!(event, Event::RevalidationFailed { .. }));
        assert_eq!(c.current().map(|p| p.id.as_str()), Some("persisted"));
        assert!(!c.loading());
        // The value is still stale, so a later schedule can arm again.
        assert!(c.schedule_revalidation(now + 10_000).is_some());
    }

    #[test]
    fn history_is_bounded() {
        let now = 10 * TTL;
        let limit = PredictionConfig::default().history_limit;
        let mut c = restored_with(None, now);
        for i in 0..(limit + 5) {
            c.apply_fetch_success(prediction(&format!("p{i}")), now + i as u64);
        }
        assert_eq!(c.history().len(), limit);
        assert_eq!(
            c.history().first().map(|p| p.id.as_str()),
            Some(format!("p{}", limit + 3).as_str())
        );
    }
}
