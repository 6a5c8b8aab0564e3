use clap::Subcommand;
use halcyon_core::storage::PREDICTION_STATE_KEY;
use halcyon_core::{
    now_ms, Config, Database, HttpPredictionSource, PredictionCache, PredictionSnapshot,
    PredictionSource,
};

#[derive(Subcommand)]
pub enum PredictAction {
    /// Print the cached prediction and its staleness as JSON
    Status,
    /// Fetch from the configured endpoint and persist the result
    Refresh,
    /// Drop the persisted prediction state
    Clear,
}

fn load_snapshot(db: &Database) -> Result<Option<PredictionSnapshot>, Box<dyn std::error::Error>> {
    match db.kv_get(PREDICTION_STATE_KEY)? {
        None => Ok(None),
        // Unreadable state is a cold start, same as the provider's path.
        Some(raw) => Ok(serde_json::from_str(&raw).ok()),
    }
}

pub fn run(action: PredictAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;

    match action {
        PredictAction::Status => {
            let now = now_ms();
            let mut cache = PredictionCache::new(config.prediction.clone());
            cache.begin_restore();
            cache.finish_restore(load_snapshot(&db)?, now);

            let status = serde_json::json!({
                "current": cache.current(),
                "last_updated_ms": cache.last_updated_ms(),
                "stale": cache.is_stale(now),
                "history_len": cache.history().len(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        PredictAction::Refresh => {
            let source = HttpPredictionSource::from_config(&config.prediction)?
                .ok_or("no prediction endpoint configured; set prediction.endpoint first")?;

            let mut cache = PredictionCache::new(config.prediction.clone());
            cache.begin_restore();
            cache.finish_restore(load_snapshot(&db)?, now_ms());

            let rt = tokio::runtime::Runtime::new()?;
            let _guard = rt.enter();
            let prediction = source.fetch_latest()?;

            let event = cache.apply_fetch_success(prediction, now_ms());
            db.kv_set(
                PREDICTION_STATE_KEY,
                &serde_json::to_string(&cache.snapshot())?,
            )?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        PredictAction::Clear => {
            let existed = db.kv_delete(PREDICTION_STATE_KEY)?;
            println!("{}", serde_json::json!({ "cleared": existed }));
            Ok(())
        }
    }
}
