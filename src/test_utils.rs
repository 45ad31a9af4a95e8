//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - In-memory SQLite setup/teardown
//! - Event fixture factories
//! - Helper assertions

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use crate::models::{
  Benchmark, Event, EventStatus, EventType, Indicator, NewEvent, PlayerLoad, Preparation, Report,
  SessionReport, SessionStats,
};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database with migrations applied
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Event Factories
/// ---------------------------------------------------------------------------

/// Calendar date `offset` days from a fixed season start
pub fn day(offset: i64) -> NaiveDate {
  NaiveDate::from_ymd_opt(2024, 8, 1).expect("valid date") + Duration::days(offset)
}

pub fn mock_event(id: &str, event_type: EventType, offset: i64) -> Event {
  NewEvent::new(event_type, day(offset)).into_event(id.to_string())
}

pub fn mock_match(id: &str, offset: i64) -> Event {
  mock_event(id, EventType::Match, offset)
}

pub fn mock_training(id: &str, offset: i64) -> Event {
  mock_event(id, EventType::Training, offset)
}

fn loaded_session(total: f64) -> SessionReport {
  SessionReport {
    full_session: Some(SessionStats {
      player_load: Some(PlayerLoad {
        total,
        p_minute: total / 100.0,
      }),
      ..Default::default()
    }),
  }
}

/// Report with a team load and per-player loads (`pMinute` is load / 100)
pub fn mock_report(team_load: f64, players: &[(&str, f64)]) -> Report {
  Report {
    team: Some(loaded_session(team_load)),
    players: players
      .iter()
      .map(|(id, load)| (id.to_string(), loaded_session(*load)))
      .collect::<BTreeMap<_, _>>(),
  }
}

/// Finished training with a team-only report
pub fn finished_training(id: &str, offset: i64, team_load: f64) -> Event {
  let mut event = mock_training(id, offset);
  event.status = Some(EventStatus {
    is_final: true,
    ..Default::default()
  });
  event.report = Some(mock_report(team_load, &[]));
  event
}

pub fn with_indicator(mut event: Event, indicator: Indicator) -> Event {
  event.benchmark.get_or_insert_with(Benchmark::default).indicator = Some(indicator);
  event
}

pub fn with_manual_indicator(event: Event, indicator: Indicator) -> Event {
  let mut event = with_indicator(event, indicator);
  if let Some(benchmark) = event.benchmark.as_mut() {
    benchmark.manual_indicator = true;
  }
  event
}

pub fn with_preparation(mut event: Event, pitch: &[&str], bench: &[&str]) -> Event {
  event.preparation = Some(Preparation {
    players_in_pitch: pitch.iter().map(|p| p.to_string()).collect(),
    players_on_bench: bench.iter().map(|p| p.to_string()).collect(),
  });
  event
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = (($left) - ($right) as f64).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'events'")
        .fetch_all(&pool)
        .await
        .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_factories_create_valid_events() {
    let training = finished_training("t", 3, 120.0);
    assert!(training.is_benchmark_source());
    assert_eq!(training.date, day(3));
    assert_eq!(training.report.as_ref().unwrap().team_session().unwrap().1.total, 120.0);

    let manual = with_manual_indicator(mock_training("m", 0), Indicator::Individual);
    assert!(manual.has_manual_indicator());
    assert_eq!(manual.stored_indicator(), Some(Indicator::Individual));

    let new_event = training.to_new_event();
    assert_eq!(new_event.into_event("t".to_string()), training);
  }
}
