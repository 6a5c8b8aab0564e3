use serde::{Deserialize, Serialize};

/// A mood prediction produced by the remote service.
///
/// The cache engine only inspects timestamps; score, label, confidence and
/// factors are carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    /// When the payload was produced upstream (epoch milliseconds).
    pub generated_at_ms: u64,
    pub score: f64,
    pub label: String,
    pub confidence: f64,
    #[serde(default)]
    pub factors: Vec<String>,
}

/// Persisted cache state, written on every accepted update and read once
/// at provider mount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionSnapshot {
    #[serde(default)]
    pub current: Option<Prediction>,
    /// When `current` was last accepted locally (epoch milliseconds).
    /// Staleness is judged against this, not `generated_at_ms`.
    #[serde(default)]
    pub last_updated_ms: Option<u64>,
    /// Recent predictions, newest first. Saved for cold-start display only;
    /// the cache engine never inspects these.
    #[serde(default)]
    pub history: Vec<Prediction>,
    #[serde(default)]
    pub was_loading: bool,
    /// Fields written by other app versions ride along untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Prediction {
        Prediction {
            id: "pred-1".into(),
            generated_at_ms: 1_700_000_000_000,
            score: 0.72,
            label: "calm".into(),
            confidence: 0.9,
            factors: vec!["sleep".into(), "journaling".into()],
        }
    }

    #[test]
    fn snapshot_roundtrip_preserves_unknown_fields() {
        let raw = r#"{
            "current": null,
            "last_updated_ms": 12345,
            "history": [],
            "was_loading": false,
            "theme_hint": "dusk"
        }"#;
        let snap: PredictionSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap.last_updated_ms, Some(12345));
        let out = serde_json::to_string(&snap).unwrap();
        assert!(out.contains("theme_hint"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let snap: PredictionSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.current.is_none());
        assert!(snap.last_updated_ms.is_none());
        assert!(snap.history.is_empty());
    }

    #[test]
    fn prediction_roundtrip() {
        let p = sample();
        let json = serde_json::to_string(&p).unwrap();
        let back: Prediction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
