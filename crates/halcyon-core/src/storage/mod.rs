mod config;
pub mod database;
pub mod store;

pub use config::{Config, PredictionConfig, ToastConfig};
pub use database::Database;
pub use store::{
    MemoryStore, SnapshotStore, SqliteStore, BIOMETRIC_PROMPT_FLAG_KEY, PREDICTION_STATE_KEY,
};

use std::path::PathBuf;

/// Returns `~/.config/halcyon[-dev]/` based on HALCYON_ENV.
///
/// Set HALCYON_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HALCYON_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("halcyon-dev")
    } else {
        base_dir.join("halcyon")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
