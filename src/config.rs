//! Engine configuration loaded from the environment

use std::env;
use std::str::FromStr;

use crate::error::{BenchmarkError, Result};

/// Sessions below this player load are treated as noise (unused substitutes)
pub const DEFAULT_PLAYER_LOAD_FLOOR: f64 = 10.0;
/// Days on each side of a match whose trainings get re-derived when it moves
pub const DEFAULT_MATCH_WINDOW_DAYS: i64 = 14;
pub const DEFAULT_MAX_SETTLE_ROUNDS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = String;
  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "pretty" => Ok(Self::Pretty),
      "json" => Ok(Self::Json),
      other => Err(format!("Unknown log format: {}", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
  pub player_load_floor: f64,
  pub match_window_days: i64,
  pub max_settle_rounds: usize,
  pub database_url: Option<String>,
  pub log_format: LogFormat,
}

impl Default for BenchmarkConfig {
  fn default() -> Self {
    Self {
      player_load_floor: DEFAULT_PLAYER_LOAD_FLOOR,
      match_window_days: DEFAULT_MATCH_WINDOW_DAYS,
      max_settle_rounds: DEFAULT_MAX_SETTLE_ROUNDS,
      database_url: None,
      log_format: LogFormat::default(),
    }
  }
}

impl BenchmarkConfig {
  /// Load from `.env` and `BENCHMARK_*` variables, falling back to defaults
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();

    let defaults = Self::default();
    Ok(Self {
      player_load_floor: parse_var("BENCHMARK_PLAYER_LOAD_FLOOR")?
        .unwrap_or(defaults.player_load_floor),
      match_window_days: parse_var("BENCHMARK_MATCH_WINDOW_DAYS")?
        .unwrap_or(defaults.match_window_days),
      max_settle_rounds: parse_var("BENCHMARK_MAX_SETTLE_ROUNDS")?
        .unwrap_or(defaults.max_settle_rounds),
      database_url: env::var("BENCHMARK_DATABASE_URL").ok(),
      log_format: parse_var("BENCHMARK_LOG_FORMAT")?.unwrap_or(defaults.log_format),
    })
  }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse::<T>()
      .map(Some)
      .map_err(|e| BenchmarkError::Config(format!("{}={:?}: {}", name, raw, e))),
    Err(_) => Ok(None),
  }
}
