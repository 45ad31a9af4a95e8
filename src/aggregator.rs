//! Benchmark aggregator
//!
//! Averages the finished sessions that share a training's indicator. Team
//! means are plain arithmetic means over the usable samples; zone and action
//! buckets are divided as they are accumulated. Player means are divided by
//! each player's own sample count, and only count sessions above the load
//! floor.

use std::collections::BTreeMap;

use tracing::debug;

use crate::classifier::effective_indicator;
use crate::config::BenchmarkConfig;
use crate::models::{
  AggregateStats, Benchmark, BenchmarkAggregate, Event, Indicator, PlayerId, PlayerLoad,
  Preparation, SessionStats, ZoneBuckets,
};

/// ---------------------------------------------------------------------------
/// Similar Events
/// ---------------------------------------------------------------------------

/// Finished sessions grouped under `indicator`, excluding the target itself.
///
/// `events` must be sorted. No-category trainings are never compared.
pub fn find_similar_events<'a>(
  target_id: &str,
  indicator: Indicator,
  events: &'a [Event],
) -> Vec<&'a Event> {
  if !indicator.is_comparable() {
    return Vec::new();
  }

  events
    .iter()
    .enumerate()
    .filter(|(_, e)| e.id != target_id && e.is_benchmark_source())
    .filter(|(idx, _)| effective_indicator(events, *idx) == indicator)
    .map(|(_, e)| e)
    .collect()
}

/// ---------------------------------------------------------------------------
/// Aggregation
/// ---------------------------------------------------------------------------

/// Raw per-player sums, local to one aggregation call
#[derive(Default)]
struct PlayerAccumulator {
  load: f64,
  load_per_min: f64,
  intensity_zones: ZoneBuckets,
  actions: ZoneBuckets,
  count: u32,
}

impl PlayerAccumulator {
  fn add(&mut self, stats: &SessionStats, load: PlayerLoad) {
    self.load += load.total;
    self.load_per_min += load.p_minute;
    self.intensity_zones.add(&stats.intensity_zones);
    self.actions.add(&stats.actions);
    self.count += 1;
  }

  fn finish(self) -> AggregateStats {
    let count = self.count as f64;
    AggregateStats {
      intensity: mean(self.load, count),
      load_per_min: mean(self.load_per_min, count),
      intensity_zones: self.intensity_zones.divided_by(count),
      actions: self.actions.divided_by(count),
    }
  }
}

fn mean(sum: f64, count: f64) -> f64 {
  if count == 0.0 {
    0.0
  } else {
    sum / count
  }
}

/// Average the reports of `similar`. Sessions without a team player load are
/// skipped and don't count toward any divisor.
pub fn aggregate(similar: &[&Event], config: &BenchmarkConfig) -> BenchmarkAggregate {
  let samples: Vec<_> = similar
    .iter()
    .filter_map(|e| {
      let report = e.report.as_ref()?;
      match report.team_session() {
        Some((stats, load)) => Some((report, stats, load)),
        None => {
          debug!(event_id = %e.id, "skipping session without team player load");
          None
        }
      }
    })
    .collect();

  if samples.is_empty() {
    return BenchmarkAggregate::default();
  }

  let count = samples.len() as f64;
  let mut total_load = 0.0;
  let mut total_load_per_min = 0.0;
  let mut intensity_zones = ZoneBuckets::default();
  let mut actions = ZoneBuckets::default();
  let mut players: BTreeMap<PlayerId, PlayerAccumulator> = BTreeMap::new();

  for (report, stats, load) in samples {
    total_load += load.total;
    total_load_per_min += load.p_minute;
    intensity_zones.add_scaled(&stats.intensity_zones, count);
    actions.add_scaled(&stats.actions, count);

    for (player_id, session) in &report.players {
      if let Some((player_stats, player_load)) = session.loaded_session() {
        if player_load.total > config.player_load_floor {
          players
            .entry(player_id.clone())
            .or_default()
            .add(player_stats, player_load);
        }
      }
    }
  }

  BenchmarkAggregate {
    team: AggregateStats {
      intensity: total_load / count,
      load_per_min: total_load_per_min / count,
      intensity_zones,
      actions,
    },
    players: players
      .into_iter()
      .map(|(id, acc)| (id, acc.finish()))
      .collect(),
  }
}

/// Drop players outside the event's own roster
pub fn prune_players(
  mut aggregate: BenchmarkAggregate,
  preparation: Option<&Preparation>,
) -> BenchmarkAggregate {
  match preparation {
    Some(prep) => aggregate.players.retain(|id, _| prep.includes(id)),
    None => aggregate.players.clear(),
  }
  aggregate
}

/// Aggregate for the event at `index` when grouped under `indicator`.
///
/// `events` must be sorted.
pub fn aggregate_for(
  events: &[Event],
  index: usize,
  indicator: Indicator,
  config: &BenchmarkConfig,
) -> BenchmarkAggregate {
  let target = &events[index];
  let similar = find_similar_events(&target.id, indicator, events);
  debug!(
    event_id = %target.id,
    indicator = %indicator,
    similar = similar.len(),
    "aggregating similar sessions"
  );
  prune_players(aggregate(&similar, config), target.preparation.as_ref())
}

/// Full benchmark for the event at `index` (sorted `events`)
pub fn benchmark_at(
  events: &[Event],
  index: usize,
  indicator: Indicator,
  config: &BenchmarkConfig,
) -> Benchmark {
  Benchmark {
    indicator: Some(indicator),
    manual_indicator: events[index].has_manual_indicator(),
    aggregate: aggregate_for(events, index, indicator, config),
  }
}

/// Benchmark for one event in an unsorted snapshot. `None` for matches and
/// unknown ids.
pub fn benchmark_for_event(
  event_id: &str,
  events: &[Event],
  config: &BenchmarkConfig,
) -> Option<Benchmark> {
  let sorted = crate::distance::sorted(events);
  let index = sorted.iter().position(|e| e.id == event_id)?;
  if !sorted[index].is_training() {
    return None;
  }
  let indicator = effective_indicator(&sorted, index);
  Some(benchmark_at(&sorted, index, indicator, config))
}
