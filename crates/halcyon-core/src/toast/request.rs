use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::ToastConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

/// A single transient message. Immutable once enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToastRequest {
    pub id: Uuid,
    pub message: String,
    #[serde(default)]
    pub kind: ToastKind,
    /// Caller-requested display time; derived from length when absent.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl ToastRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            kind: ToastKind::Info,
            duration_ms: None,
        }
    }

    pub fn with_kind(mut self, kind: ToastKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Display time for this toast.
    ///
    /// A caller-requested duration is used as given. Otherwise the
    /// duration grows with message length past the short-message
    /// threshold, clamped to the configured bounds, so long messages stay
    /// legible without the caller computing timing.
    pub fn display_duration_ms(&self, config: &ToastConfig) -> u64 {
        if let Some(ms) = self.duration_ms {
            return ms;
        }
        let chars = self.message.chars().count() as u64;
        let extra = chars
            .saturating_sub(config.short_threshold_chars)
            .saturating_mul(config.per_char_ms);
        config
            .base_ms
            .saturating_add(extra)
            .min(config.max_ms)
            .max(config.min_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_gets_base_duration() {
        let config = ToastConfig::default();
        let toast = ToastRequest::new("Saved");
        assert_eq!(toast.display_duration_ms(&config), config.base_ms);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = ToastConfig::default();
        let at = ToastRequest::new("x".repeat(config.short_threshold_chars as usize));
        assert_eq!(at.display_duration_ms(&config), config.base_ms);
        let over = ToastRequest::new("x".repeat(config.short_threshold_chars as usize + 1));
        assert_eq!(
            over.display_duration_ms(&config),
            config.base_ms + config.per_char_ms
        );
    }

    #[test]
    fn long_message_gets_materially_more_time() {
        let config = ToastConfig::default();
        let toast = ToastRequest::new("x".repeat(70));
        let d = toast.display_duration_ms(&config);
        assert_eq!(d, config.base_ms + 30 * config.per_char_ms);
        assert!(d >= config.base_ms + 1_500);
    }

    #[test]
    fn derived_duration_is_capped() {
        let config = ToastConfig::default();
        let toast = ToastRequest::new("x".repeat(10_000));
        assert_eq!(toast.display_duration_ms(&config), config.max_ms);
    }

    #[test]
    fn requested_duration_wins() {
        let config = ToastConfig::default();
        let toast = ToastRequest::new("x".repeat(10_000)).with_duration_ms(1_000);
        assert_eq!(toast.display_duration_ms(&config), 1_000);
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let config = ToastConfig::default();
        // 10 multibyte chars, well under the threshold.
        let toast = ToastRequest::new("ねむいですねおやすみなさい".chars().take(10).collect::<String>());
        assert_eq!(toast.display_duration_ms(&config), config.base_ms);
    }
}
