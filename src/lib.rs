//! Matchday benchmarks for training sessions
//!
//! Trainings are grouped by their distance to the nearest match (MD-3, MD+1,
//! ...), and every upcoming training carries the average load of the finished
//! sessions in its group. The engine is pure; `commands` wires it to an
//! `EventStore`.

pub mod aggregator;
pub mod classifier;
pub mod commands;
pub mod config;
pub mod db;
pub mod distance;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use aggregator::{aggregate, benchmark_for_event, find_similar_events};
pub use classifier::{categorize_training_events, classify};
pub use commands::BenchmarkUpdate;
pub use config::BenchmarkConfig;
pub use db::SqliteEventStore;
pub use distance::{resolve_match_distances, MatchDistance, MatchDistances};
pub use error::{BenchmarkError, Result};
pub use store::{EventStore, MemoryEventStore};

use tracing::info;

/// Load configuration from the environment, install logging and open the
/// SQLite-backed store
pub async fn bootstrap() -> Result<(BenchmarkConfig, SqliteEventStore)> {
  let config = BenchmarkConfig::from_env()?;
  logging::init_logging(&config);

  let pool = db::initialize_db(&config).await?;
  info!(
    floor = config.player_load_floor,
    window_days = config.match_window_days,
    "benchmark engine ready"
  );

  Ok((config, SqliteEventStore::new(pool)))
}
