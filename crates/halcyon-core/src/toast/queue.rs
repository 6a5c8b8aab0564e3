//! Toast queue state machine.
//!
//! Serializes transient messages into a single visible slot, strictly in
//! arrival order. Like the prediction cache, the queue is wall-clock-based
//! and caller-ticked: every operation takes `now_ms`, and the host is
//! responsible for calling `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Entering -> Visible -> Exiting -> Idle (loop)
//! ```
//!
//! `dismiss()` shortcuts Entering/Visible directly into Exiting and is the
//! only operation that cancels an armed timer. When the exit transition
//! completes, the next pending request (if any) is promoted in the same
//! tick, so the queue drains with no gap beyond the exit animation.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::request::ToastRequest;
use crate::events::Event;
use crate::storage::ToastConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastPhase {
    Idle,
    Entering,
    Visible,
    Exiting,
}

/// Core toast queue.
///
/// Invariant: `active` is non-null iff `phase != Idle`. While a toast is
/// entering or visible, `show` only appends; nothing is reordered or
/// interrupted.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    config: ToastConfig,
    pending: VecDeque<ToastRequest>,
    active: Option<ToastRequest>,
    phase: ToastPhase,
    /// Deadline for Entering -> Visible (epoch milliseconds).
    enter_done_at_ms: Option<u64>,
    /// Auto-dismiss deadline, armed at promotion (epoch milliseconds).
    dismiss_at_ms: Option<u64>,
    /// Deadline for Exiting -> Idle (epoch milliseconds).
    exit_done_at_ms: Option<u64>,
}

impl ToastQueue {
    pub fn new(config: ToastConfig) -> Self {
        Self {
            config,
            pending: VecDeque::new(),
            active: None,
            phase: ToastPhase::Idle,
            enter_done_at_ms: None,
            dismiss_at_ms: None,
            exit_done_at_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> ToastPhase {
        self.phase
    }

    pub fn active(&self) -> Option<&ToastRequest> {
        self.active.as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enqueue a request. If nothing is visible it is promoted
    /// immediately; otherwise it waits its turn (FIFO, non-preemptive).
    pub fn show(&mut self, request: ToastRequest, now_ms: u64) -> Event {
        if self.phase == ToastPhase::Idle {
            self.promote(request, now_ms)
        } else {
            let id = request.id;
            self.pending.push_back(request);
            Event::ToastQueued {
                id,
                position: self.pending.len(),
                at: Utc::now(),
            }
        }
    }

    /// Manually dismiss the active toast. Valid while entering or
    /// visible; cancels the auto-dismiss timer and begins the exit
    /// transition. A no-op when nothing is dismissable (idempotent).
    pub fn dismiss(&mut self, now_ms: u64) -> Option<Event> {
        match self.phase {
            ToastPhase::Entering | ToastPhase::Visible => {
                let id = self.active.as_ref().map(|a| a.id)?;
                self.begin_exit(now_ms);
                Some(Event::ToastDismissed {
                    id,
                    manual: true,
                    at: Utc::now(),
                })
            }
            ToastPhase::Idle | ToastPhase::Exiting => None,
        }
    }

    /// Call periodically. A late tick may drive several transitions, so
    /// all resulting events are returned in order.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            match self.phase {
                ToastPhase::Idle => break,
                ToastPhase::Entering => {
                    // A very short duration can expire inside the enter
                    // transition; the dismiss deadline takes priority.
                    if self.dismiss_at_ms.is_some_and(|t| now_ms >= t) {
                        if let Some(ev) = self.auto_dismiss(now_ms) {
                            events.push(ev);
                        }
                        continue;
                    }
                    if self.enter_done_at_ms.is_some_and(|t| now_ms >= t) {
                        self.enter_done_at_ms = None;
                        self.phase = ToastPhase::Visible;
                        continue;
                    }
                    break;
                }
                ToastPhase::Visible => {
                    if self.dismiss_at_ms.is_some_and(|t| now_ms >= t) {
                        if let Some(ev) = self.auto_dismiss(now_ms) {
                            events.push(ev);
                        }
                        continue;
                    }
                    break;
                }
                ToastPhase::Exiting => {
                    if self.exit_done_at_ms.is_some_and(|t| now_ms >= t) {
                        self.exit_done_at_ms = None;
                        self.phase = ToastPhase::Idle;
                        if let Some(closed) = self.active.take() {
                            events.push(Event::ToastClosed {
                                id: closed.id,
                                at: Utc::now(),
                            });
                        }
                        if let Some(next) = self.pending.pop_front() {
                            events.push(self.promote(next, now_ms));
                            continue;
                        }
                        break;
                    }
                    break;
                }
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn promote(&mut self, request: ToastRequest, now_ms: u64) -> Event {
        let duration_ms = request.display_duration_ms(&self.config);
        self.phase = ToastPhase::Entering;
        self.enter_done_at_ms = Some(now_ms + self.config.enter_ms);
        // The dismiss clock starts at promotion; the enter transition
        // runs inside it.
        self.dismiss_at_ms = Some(now_ms + duration_ms);
        self.exit_done_at_ms = None;
        let event = Event::ToastShown {
            id: request.id,
            message: request.message.clone(),
            kind: request.kind,
            duration_ms,
            at: Utc::now(),
        };
        self.active = Some(request);
        event
    }

    fn auto_dismiss(&mut self, now_ms: u64) -> Option<Event> {
        let id = self.active.as_ref().map(|a| a.id);
        self.begin_exit(now_ms);
        Some(Event::ToastDismissed {
            id: id?,
            manual: false,
            at: Utc::now(),
        })
    }

    fn begin_exit(&mut self, now_ms: u64) {
        self.dismiss_at_ms = None;
        self.enter_done_at_ms = None;
        self.phase = ToastPhase::Exiting;
        self.exit_done_at_ms = Some(now_ms + self.config.exit_ms);
    }
}
