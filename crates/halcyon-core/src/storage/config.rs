//! TOML-based application configuration.
//!
//! Stores the tunable constants of the two state engines:
//! - Prediction cache: TTL, revalidation delay, history bound, endpoint
//! - Toast queue: duration formula and transition timings
//!
//! Configuration is stored at `~/.config/halcyon/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;

/// Prediction cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Maximum age before the cached prediction is considered stale.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    /// Delay between a staleness verdict and the actual fetch. Absorbs
    /// rapid remounts and lets the restored value paint first.
    #[serde(default = "default_revalidate_delay_ms")]
    pub revalidate_delay_ms: u64,
    /// How many superseded predictions to keep for cold-start display.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Prediction service endpoint. Absent means remote fetch is not
    /// configured and the cache only ever serves persisted data.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Toast queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToastConfig {
    /// Display time for a short message.
    #[serde(default = "default_toast_base_ms")]
    pub base_ms: u64,
    /// Message length (chars) above which display time starts growing.
    #[serde(default = "default_short_threshold_chars")]
    pub short_threshold_chars: u64,
    /// Extra display time per character past the threshold.
    #[serde(default = "default_per_char_ms")]
    pub per_char_ms: u64,
    #[serde(default = "default_toast_min_ms")]
    pub min_ms: u64,
    #[serde(default = "default_toast_max_ms")]
    pub max_ms: u64,
    /// Enter transition length; runs inside the display-time clock.
    #[serde(default = "default_enter_ms")]
    pub enter_ms: u64,
    /// Exit transition length; the only gap between queued toasts.
    #[serde(default = "default_exit_ms")]
    pub exit_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/halcyon/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub toast: ToastConfig,
}

// Default functions
fn default_ttl_ms() -> u64 {
    3 * 60 * 60 * 1000 // 3 hours
}
fn default_revalidate_delay_ms() -> u64 {
    400
}
fn default_history_limit() -> usize {
    30
}
fn default_toast_base_ms() -> u64 {
    3_500
}
fn default_short_threshold_chars() -> u64 {
    40
}
fn default_per_char_ms() -> u64 {
    50
}
fn default_toast_min_ms() -> u64 {
    2_000
}
fn default_toast_max_ms() -> u64 {
    8_000
}
fn default_enter_ms() -> u64 {
    200
}
fn default_exit_ms() -> u64 {
    200
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            revalidate_delay_ms: default_revalidate_delay_ms(),
            history_limit: default_history_limit(),
            endpoint: None,
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            base_ms: default_toast_base_ms(),
            short_threshold_chars: default_short_threshold_chars(),
            per_char_ms: default_per_char_ms(),
            min_ms: default_toast_min_ms(),
            max_ms: default_toast_max_ms(),
            enter_ms: default_enter_ms(),
            exit_ms: default_exit_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let value = Self::get_json_value_by_path(&json, key)?;
        Some(match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a config value by dot-separated key, preserving the field's
    /// existing type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        let mut parts = key.split('.').peekable();
        let mut current = &mut json;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                    serde_json::Value::Number(_) => {
                        serde_json::Value::Number(value.parse::<u64>()?.into())
                    }
                    _ => serde_json::Value::String(value.into()),
                };
                obj.insert(part.to_string(), new_value);
                *self = serde_json::from_value(json)?;
                return Ok(());
            }
            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }
        Err(format!("unknown config key: {key}").into())
    }
}
