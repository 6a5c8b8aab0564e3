//! # Halcyon Core Library
//!
//! This library provides the core state engine for the Halcyon wellness
//! app. All logic lives here; any GUI is a thin rendering layer over the
//! same types, and the standalone CLI binary exercises them directly.
//!
//! ## Architecture
//!
//! - **Prediction cache**: a wall-clock-based state machine holding the
//!   single current mood prediction, with TTL staleness, delayed background
//!   revalidation, and persisted snapshots
//! - **Toast queue**: a state machine serializing transient messages into
//!   one visible slot, FIFO, with length-scaled display durations
//! - **Storage**: SQLite-backed key-value store and TOML configuration
//! - **Drivers**: tokio-based provider/host handles that tick the machines
//!   and are torn down (timers cleared) on unmount
//!
//! Both machines require the caller to periodically invoke `tick()` for
//! progress; they own no threads or timers themselves, which is what makes
//! time fully simulatable in tests.
//!
//! ## Key Components
//!
//! - [`PredictionCache`]: staleness-aware cache state machine
//! - [`ToastQueue`]: serialized notification queue
//! - [`PredictionProvider`] / [`ToastHost`]: mounted driver handles
//! - [`Database`] / [`Config`]: persistence and configuration

pub mod error;
pub mod events;
pub mod prediction;
pub mod storage;
pub mod toast;

pub use error::{ConfigError, CoreError, FetchError, PersistenceError};
pub use events::Event;
pub use prediction::{
    CacheState, ErrorReporter, HttpPredictionSource, Prediction, PredictionCache,
    PredictionProvider, PredictionSnapshot, PredictionSource,
};
pub use storage::{
    Config, Database, MemoryStore, PredictionConfig, SnapshotStore, SqliteStore, ToastConfig,
};
pub use toast::{ToastHost, ToastKind, ToastPhase, ToastQueue, ToastRequest};

/// Wall clock as epoch milliseconds. The engines never call this
/// themselves; drivers sample it and pass it in.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
