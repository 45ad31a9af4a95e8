//! Recalculation Orchestrator
//!
//! Reacts to event-store mutations and works out which benchmarks need to be
//! rewritten. Everything here is pure: a snapshot goes in, patches come out.
//!
//! Each handler returns direct patches plus follow-ups (group propagation,
//! re-categorization around a match date). `settle` drains the follow-ups in
//! a worklist loop against a working copy of the snapshot, so nothing here
//! dispatches recursively.
//!
//! Targets and sources:
//! - a target is an unfinished training with no report and no manual override;
//!   only targets get their aggregate refreshed by siblings
//! - a source is a finished training with a report; sources feed aggregates
//!   until they are deleted

use std::collections::VecDeque;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate_for, benchmark_at};
use crate::classifier::{computed_indicator, effective_indicator};
use crate::config::BenchmarkConfig;
use crate::distance::{day_distance, sorted};
use crate::models::{BenchmarkPatch, Event, EventId, EventPatch, Indicator};

/// ---------------------------------------------------------------------------
/// Worklist
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
  /// Refresh every target grouped under `indicator`, optionally only those
  /// on or after `from`
  PropagateGroup {
    indicator: Indicator,
    from: Option<NaiveDate>,
    exclude: Option<EventId>,
  },
  /// Re-derive indicators for targets near a match that appeared, moved or
  /// disappeared
  RecategorizeAround { date: NaiveDate },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recalculation {
  pub patches: Vec<EventPatch>,
  pub follow_ups: Vec<FollowUp>,
}

impl Recalculation {
  fn patch(&mut self, event_id: &str, benchmark: BenchmarkPatch) {
    self.patches.push(EventPatch {
      event_id: event_id.to_string(),
      benchmark,
    });
  }

  fn follow(&mut self, follow_up: FollowUp) {
    if !self.follow_ups.contains(&follow_up) {
      self.follow_ups.push(follow_up);
    }
  }

  pub fn is_empty(&self) -> bool {
    self.patches.is_empty() && self.follow_ups.is_empty()
  }
}

fn full_patch(
  events: &[Event],
  index: usize,
  indicator: Indicator,
  config: &BenchmarkConfig,
) -> BenchmarkPatch {
  let benchmark = benchmark_at(events, index, indicator, config);
  BenchmarkPatch {
    indicator: benchmark.indicator,
    manual_indicator: Some(benchmark.manual_indicator),
    aggregate: Some(benchmark.aggregate),
  }
}

/// Indicator a removed (or otherwise absent) event had within `snapshot`
fn indicator_within(event: &Event, snapshot: &[Event]) -> Indicator {
  if let Some(stored) = event.stored_indicator() {
    return stored;
  }
  let mut events: Vec<Event> = snapshot.iter().filter(|e| e.id != event.id).cloned().collect();
  events.push(event.clone());
  let events = sorted(&events);
  let index = events.iter().position(|e| e.id == event.id).unwrap_or_default();
  effective_indicator(&events, index)
}

/// ---------------------------------------------------------------------------
/// Follow-up Executors
/// ---------------------------------------------------------------------------

/// Refresh aggregates of every target in the `indicator` group.
///
/// No-category groups are skipped; there is nothing to average there.
pub fn propagate_group(
  indicator: Indicator,
  from: Option<NaiveDate>,
  exclude: Option<&str>,
  snapshot: &[Event],
  config: &BenchmarkConfig,
) -> Vec<EventPatch> {
  if !indicator.is_comparable() {
    return Vec::new();
  }

  let events = sorted(snapshot);
  events
    .iter()
    .enumerate()
    .filter(|(_, e)| e.is_benchmark_target())
    .filter(|(_, e)| e.stored_indicator() == Some(indicator))
    .filter(|(_, e)| exclude != Some(e.id.as_str()))
    .filter(|(_, e)| from.map_or(true, |d| e.date >= d))
    .map(|(idx, e)| EventPatch {
      event_id: e.id.clone(),
      benchmark: BenchmarkPatch {
        aggregate: Some(aggregate_for(&events, idx, indicator, config)),
        ..Default::default()
      },
    })
    .collect()
}

/// Re-derive indicators of targets within the match window around `date`.
///
/// Only events whose indicator actually changes get a patch.
pub fn recategorize_around(
  date: NaiveDate,
  snapshot: &[Event],
  config: &BenchmarkConfig,
) -> Vec<EventPatch> {
  let events = sorted(snapshot);
  let mut patches = Vec::new();

  for (idx, event) in events.iter().enumerate() {
    if !event.is_benchmark_target() {
      continue;
    }
    if day_distance(date, event.date).abs() > config.match_window_days {
      continue;
    }

    let indicator = computed_indicator(&events, idx);
    if event.stored_indicator() == Some(indicator) {
      continue;
    }

    debug!(
      event_id = %event.id,
      from = ?event.stored_indicator(),
      to = %indicator,
      "training recategorized"
    );
    patches.push(EventPatch {
      event_id: event.id.clone(),
      benchmark: full_patch(&events, idx, indicator, config),
    });
  }

  patches
}

fn run_follow_up(
  follow_up: &FollowUp,
  snapshot: &[Event],
  config: &BenchmarkConfig,
) -> Recalculation {
  let patches = match follow_up {
    FollowUp::PropagateGroup {
      indicator,
      from,
      exclude,
    } => propagate_group(*indicator, *from, exclude.as_deref(), snapshot, config),
    FollowUp::RecategorizeAround { date } => recategorize_around(*date, snapshot, config),
  };
  Recalculation {
    patches,
    follow_ups: Vec::new(),
  }
}

/// ---------------------------------------------------------------------------
/// Mutation Handlers
/// ---------------------------------------------------------------------------

/// Events were created (single or batch/recurring). `snapshot` already holds
/// them with their store-assigned ids, alongside every existing event.
pub fn on_create(
  created: &[EventId],
  snapshot: &[Event],
  config: &BenchmarkConfig,
) -> Recalculation {
  let events = sorted(snapshot);
  let mut recalculation = Recalculation::default();

  for id in created {
    let Some(idx) = events.iter().position(|e| &e.id == id) else {
      warn!(event_id = %id, "created event missing from snapshot");
      continue;
    };
    let event = &events[idx];

    if event.is_match() {
      recalculation.follow(FollowUp::RecategorizeAround { date: event.date });
      continue;
    }

    let indicator = effective_indicator(&events, idx);
    recalculation.patch(&event.id, full_patch(&events, idx, indicator, config));

    // An imported, already finished session feeds its group straight away
    if event.is_benchmark_source() {
      recalculation.follow(FollowUp::PropagateGroup {
        indicator,
        from: Some(event.date),
        exclude: Some(event.id.clone()),
      });
    }
  }

  recalculation
}

/// An event changed. `previous` is the stored version before the edit;
/// `snapshot` holds the edited version under the same id.
pub fn on_update(previous: &Event, snapshot: &[Event], config: &BenchmarkConfig) -> Recalculation {
  let events = sorted(snapshot);
  let mut recalculation = Recalculation::default();

  let Some(idx) = events.iter().position(|e| e.id == previous.id) else {
    warn!(event_id = %previous.id, "updated event missing from snapshot");
    return recalculation;
  };
  let current = &events[idx];
  let moved = previous.date != current.date || previous.start_time != current.start_time;
  let type_changed = previous.event_type != current.event_type;

  // Matches are the reference points: moving one shifts nearby trainings
  if previous.is_match() && (moved || type_changed) {
    recalculation.follow(FollowUp::RecategorizeAround { date: previous.date });
  }
  if current.is_match() {
    if moved || type_changed {
      recalculation.follow(FollowUp::RecategorizeAround { date: current.date });
    }
    if previous.is_benchmark_source() {
      recalculation.follow(FollowUp::PropagateGroup {
        indicator: indicator_within(previous, snapshot),
        from: None,
        exclude: None,
      });
    }
    return recalculation;
  }

  let old_indicator = previous.stored_indicator();
  let manual_changed = previous.has_manual_indicator() != current.has_manual_indicator();

  let new_indicator = if current.has_pinned_indicator() {
    current
      .stored_indicator()
      .unwrap_or_else(|| computed_indicator(&events, idx))
  } else if moved || manual_changed || type_changed || old_indicator.is_none() {
    computed_indicator(&events, idx)
  } else {
    effective_indicator(&events, idx)
  };

  if old_indicator != Some(new_indicator) || manual_changed || type_changed {
    info!(
      event_id = %current.id,
      from = ?old_indicator,
      to = %new_indicator,
      "training indicator changed"
    );
    recalculation.patch(&current.id, full_patch(&events, idx, new_indicator, config));

    // The old group may have been averaging this session, or waiting on it
    if let Some(old) = old_indicator {
      recalculation.follow(FollowUp::PropagateGroup {
        indicator: old,
        from: None,
        exclude: Some(current.id.clone()),
      });
    }
    // A relabelled session now feeds its new group
    if current.is_benchmark_source() {
      recalculation.follow(FollowUp::PropagateGroup {
        indicator: new_indicator,
        from: Some(current.date),
        exclude: Some(current.id.clone()),
      });
    }
  } else if !current.is_final() {
    // Roster edits change which players belong in the aggregate
    let aggregate = aggregate_for(&events, idx, new_indicator, config);
    let stored = current.benchmark.as_ref().map(|b| &b.aggregate);
    if stored != Some(&aggregate) {
      recalculation.patch(
        &current.id,
        BenchmarkPatch {
          aggregate: Some(aggregate),
          ..Default::default()
        },
      );
    }
  }

  let report_changed = previous.report != current.report;
  if current.is_benchmark_source() && (!previous.is_benchmark_source() || report_changed || moved) {
    recalculation.follow(FollowUp::PropagateGroup {
      indicator: new_indicator,
      from: Some(current.date),
      exclude: Some(current.id.clone()),
    });
  }
  if previous.is_benchmark_source() && !current.is_benchmark_source() {
    recalculation.follow(FollowUp::PropagateGroup {
      indicator: old_indicator.unwrap_or(new_indicator),
      from: Some(previous.date),
      exclude: Some(current.id.clone()),
    });
  }

  recalculation
}

/// Events were removed (single or batch/recurring). `snapshot` no longer
/// contains them.
pub fn on_delete(
  removed: &[Event],
  snapshot: &[Event],
  _config: &BenchmarkConfig,
) -> Recalculation {
  let mut recalculation = Recalculation::default();

  for event in removed {
    if event.is_match() {
      recalculation.follow(FollowUp::RecategorizeAround { date: event.date });
    } else if event.is_benchmark_source() {
      recalculation.follow(FollowUp::PropagateGroup {
        indicator: indicator_within(event, snapshot),
        from: Some(event.date),
        exclude: None,
      });
    }
  }

  recalculation
}

/// ---------------------------------------------------------------------------
/// Fixed-point Settle
/// ---------------------------------------------------------------------------

/// Apply `recalculation` to a working copy of `snapshot` and drain its
/// follow-ups until none are left. Returns one merged patch per event, in the
/// order events were first touched; patches that change nothing are dropped.
pub fn settle(
  snapshot: &[Event],
  recalculation: Recalculation,
  config: &BenchmarkConfig,
) -> Vec<EventPatch> {
  let mut working = snapshot.to_vec();
  let mut merged: Vec<EventPatch> = Vec::new();
  let mut queue: VecDeque<FollowUp> = VecDeque::new();
  let mut done: Vec<FollowUp> = Vec::new();

  let mut pending = recalculation;
  let mut rounds = 0;

  loop {
    for patch in pending.patches.drain(..) {
      apply_to_working(&mut working, &mut merged, patch);
    }
    queue.extend(pending.follow_ups.drain(..));

    let Some(follow_up) = queue.pop_front() else {
      break;
    };
    if done.contains(&follow_up) {
      pending = Recalculation::default();
      continue;
    }
    if rounds >= config.max_settle_rounds {
      warn!(
        rounds,
        remaining = queue.len() + 1,
        "benchmark recalculation did not settle, dropping remaining follow-ups"
      );
      break;
    }
    rounds += 1;

    debug!(?follow_up, "running follow-up");
    pending = run_follow_up(&follow_up, &working, config);
    done.push(follow_up);
  }

  info!(patches = merged.len(), follow_ups = rounds, "benchmark recalculation settled");
  merged
}

fn apply_to_working(working: &mut [Event], merged: &mut Vec<EventPatch>, patch: EventPatch) {
  let Some(event) = working.iter_mut().find(|e| e.id == patch.event_id) else {
    warn!(event_id = %patch.event_id, "patch for unknown event dropped");
    return;
  };

  let before = event.benchmark.clone();
  event.apply_patch(&patch.benchmark);
  if event.benchmark == before {
    return;
  }

  match merged.iter_mut().find(|p| p.event_id == patch.event_id) {
    Some(existing) => existing.benchmark.absorb(patch.benchmark),
    None => merged.push(patch),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::models::BenchmarkAggregate;
  use crate::test_utils::{
    day, finished_training, mock_match, mock_training, with_indicator, with_manual_indicator,
  };

  fn config() -> BenchmarkConfig {
    BenchmarkConfig::default()
  }

  /// Apply settled patches back onto a snapshot, like the store would
  fn apply(snapshot: &mut [Event], patches: &[EventPatch]) {
    for patch in patches {
      if let Some(event) = snapshot.iter_mut().find(|e| e.id == patch.event_id) {
        event.apply_patch(&patch.benchmark);
      }
    }
  }

  fn find<'a>(events: &'a [Event], id: &str) -> &'a Event {
    events.iter().find(|e| e.id == id).unwrap()
  }

  fn intensity(events: &[Event], id: &str) -> f64 {
    find(events, id)
      .benchmark
      .as_ref()
      .map(|b| b.aggregate.team.intensity)
      .unwrap_or_default()
  }

  /// Three finished MD-1 sessions with loads 100/120/140
  fn md_minus_one_history() -> Vec<Event> {
    vec![
      with_indicator(finished_training("f1", 0, 100.0), Indicator::Matchday(-1)),
      mock_match("m1", 1),
      with_indicator(finished_training("f2", 7, 120.0), Indicator::Matchday(-1)),
      mock_match("m2", 8),
      with_indicator(finished_training("f3", 14, 140.0), Indicator::Matchday(-1)),
      mock_match("m3", 15),
      mock_match("m4", 22),
    ]
  }

  #[test]
  fn test_create_attaches_initial_benchmark() {
    // Arrange
    let mut events = md_minus_one_history();
    events.push(mock_training("new", 21));

    // Act
    let recalculation = on_create(&["new".to_string()], &events, &config());
    let patches = settle(&events, recalculation, &config());

    // Assert
    assert_eq!(patches.len(), 1);
    let patch = &patches[0].benchmark;
    assert_eq!(patch.indicator, Some(Indicator::Matchday(-1)));
    assert_eq!(patch.manual_indicator, Some(false));
    assert_approx_eq!(patch.aggregate.as_ref().unwrap().team.intensity, 120.0, 1e-9);
  }

  #[test]
  fn test_delete_finished_sibling_updates_mean() {
    // Arrange: the upcoming MD-1 already shows the 3-session mean
    let mut events = md_minus_one_history();
    events.push(mock_training("new", 21));
    let created = on_create(&["new".to_string()], &events, &config());
    let patches = settle(&events, created, &config());
    apply(&mut events, &patches);
    assert_approx_eq!(intensity(&events, "new"), 120.0, 1e-9);

    // Act: drop the 140-load session
    let removed = vec![find(&events, "f3").clone()];
    events.retain(|e| e.id != "f3");
    let recalculation = on_delete(&removed, &events, &config());
    let patches = settle(&events, recalculation, &config());
    apply(&mut events, &patches);

    // Assert
    assert_approx_eq!(intensity(&events, "new"), 110.0, 1e-9);
  }

  #[test]
  fn test_new_report_propagates_forward_only() {
    // Arrange: upcoming MD-1 trainings before and after the session that finishes
    let mut events = md_minus_one_history();
    events.push(mock_match("m0", -6));
    events.push(with_indicator(mock_training("earlier", -7), Indicator::Matchday(-1)));
    events.push(with_indicator(mock_training("later", 21), Indicator::Matchday(-1)));
    let previous = with_indicator(mock_training("finishing", 7), Indicator::Matchday(-1));
    events.push(previous.clone());

    // Act: the day-7 session gets its final report (load 400)
    let idx = events.iter().position(|e| e.id == "finishing").unwrap();
    events[idx] = with_indicator(finished_training("finishing", 7, 400.0), Indicator::Matchday(-1));
    let recalculation = on_update(&previous, &events, &config());
    let patches = settle(&events, recalculation, &config());

    // Assert: only the later training is refreshed
    let ids: Vec<_> = patches.iter().map(|p| p.event_id.as_str()).collect();
    assert_eq!(ids, vec!["later"]);
    let later = patches[0].benchmark.aggregate.as_ref().unwrap();
    assert_approx_eq!(later.team.intensity, (100.0 + 120.0 + 140.0 + 400.0) / 4.0, 1e-9);
  }

  #[test]
  fn test_propagation_skips_finished_and_manual_targets() {
    let mut events = md_minus_one_history();
    events.push(with_manual_indicator(mock_training("manual", 21), Indicator::Matchday(-1)));
    events.push(with_indicator(mock_training("open", 21), Indicator::Matchday(-1)));

    let patches = propagate_group(Indicator::Matchday(-1), None, None, &events, &config());

    let ids: Vec<_> = patches.iter().map(|p| p.event_id.as_str()).collect();
    assert_eq!(ids, vec!["open"]);
  }

  #[test]
  fn test_no_category_group_is_never_propagated() {
    let events = vec![
      with_indicator(finished_training("f", 0, 100.0), Indicator::NoCategory),
      with_indicator(mock_training("t", 40), Indicator::NoCategory),
    ];

    assert!(propagate_group(Indicator::NoCategory, None, None, &events, &config()).is_empty());
  }

  #[test]
  fn test_deleting_match_leaves_training_without_category() {
    // Arrange: training sits 2 days after the only match
    let mut events = vec![
      with_indicator(finished_training("f", -20, 100.0), Indicator::Matchday(2)),
      mock_match("m", 0),
      mock_training("t", 2),
    ];
    let created = on_create(&["t".to_string()], &events, &config());
    let patches = settle(&events, created, &config());
    apply(&mut events, &patches);
    assert_eq!(find(&events, "t").stored_indicator(), Some(Indicator::Matchday(2)));
    assert_approx_eq!(intensity(&events, "t"), 100.0, 1e-9);

    // Act
    let removed = vec![find(&events, "m").clone()];
    events.retain(|e| e.id != "m");
    let recalculation = on_delete(&removed, &events, &config());
    let patches = settle(&events, recalculation, &config());
    apply(&mut events, &patches);

    // Assert
    let training = find(&events, "t");
    assert_eq!(training.stored_indicator(), Some(Indicator::NoCategory));
    assert_eq!(
      training.benchmark.as_ref().unwrap().aggregate,
      BenchmarkAggregate::default()
    );
  }

  #[test]
  fn test_inserting_match_recategorizes_nearby_targets_only() {
    // Arrange
    let mut events = vec![
      mock_match("m0", 0),
      with_indicator(mock_training("near", 5), Indicator::NoCategory),
      with_indicator(mock_training("far", 40), Indicator::NoCategory),
      with_manual_indicator(mock_training("manual", 6), Indicator::Matchday(3)),
      with_indicator(finished_training("done", 4, 50.0), Indicator::NoCategory),
    ];
    events.push(mock_match("m1", 7));

    // Act
    let recalculation = on_create(&["m1".to_string()], &events, &config());
    let patches = settle(&events, recalculation, &config());

    // Assert
    let ids: Vec<_> = patches.iter().map(|p| p.event_id.as_str()).collect();
    assert_eq!(ids, vec!["near"]);
    assert_eq!(patches[0].benchmark.indicator, Some(Indicator::Matchday(-2)));
  }

  #[test]
  fn test_recategorize_suppresses_noop_writes() {
    let events = vec![
      mock_match("m0", 0),
      with_indicator(mock_training("t", 1), Indicator::Matchday(1)),
    ];

    assert!(recategorize_around(day(0), &events, &config()).is_empty());
  }

  #[test]
  fn test_manual_indicator_survives_match_moves() {
    // Arrange
    let mut events = vec![
      mock_match("m", 0),
      with_manual_indicator(mock_training("t", 1), Indicator::Matchday(-5)),
    ];
    let previous = events[0].clone();

    // Act: move the match right next to the training
    events[0].date = day(2);
    let recalculation = on_update(&previous, &events, &config());
    let patches = settle(&events, recalculation, &config());
    apply(&mut events, &patches);

    // Assert
    assert!(patches.is_empty());
    assert_eq!(find(&events, "t").stored_indicator(), Some(Indicator::Matchday(-5)));
  }

  #[test]
  fn test_manual_override_regroups_and_refreshes_old_group() {
    // Arrange: two MD-1 targets, one of which the coach re-labels MD-3
    let mut events = md_minus_one_history();
    events.push(with_indicator(finished_training("f-md3", 30, 300.0), Indicator::Matchday(-3)));
    events.push(with_indicator(mock_training("moved", 21), Indicator::Matchday(-1)));
    events.push(with_indicator(mock_training("sibling", 21), Indicator::Matchday(-1)));
    let previous = find(&events, "moved").clone();

    // Act
    let idx = events.iter().position(|e| e.id == "moved").unwrap();
    events[idx] = with_manual_indicator(previous.clone(), Indicator::Matchday(-3));
    let recalculation = on_update(&previous, &events, &config());
    let patches = settle(&events, recalculation, &config());
    apply(&mut events, &patches);

    // Assert: the overridden training averages the MD-3 group
    let moved = find(&events, "moved");
    assert_eq!(moved.stored_indicator(), Some(Indicator::Matchday(-3)));
    assert!(moved.has_manual_indicator());
    assert_approx_eq!(intensity(&events, "moved"), 300.0, 1e-9);
    // and the old group was recomputed for its remaining target
    assert!(patches.iter().any(|p| p.event_id == "sibling"));
    assert_approx_eq!(intensity(&events, "sibling"), 120.0, 1e-9);
  }

  #[test]
  fn test_moving_training_recomputes_its_indicator() {
    let mut events = vec![
      mock_match("m", 10),
      with_indicator(mock_training("t", 9), Indicator::Matchday(-1)),
    ];
    let previous = events[1].clone();

    events[1].date = day(7);
    let recalculation = on_update(&previous, &events, &config());
    let patches = settle(&events, recalculation, &config());

    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].benchmark.indicator, Some(Indicator::Matchday(-3)));
  }

  #[test]
  fn test_batch_create_classifies_against_new_siblings() {
    // A recurring series created together with the match it leads into
    let events = vec![
      mock_training("r1", 0),
      mock_training("r2", 1),
      mock_match("m", 2),
    ];
    let created: Vec<EventId> = events.iter().map(|e| e.id.clone()).collect();

    let recalculation = on_create(&created, &events, &config());
    let patches = settle(&events, recalculation, &config());

    let indicators: Vec<_> = patches
      .iter()
      .map(|p| (p.event_id.as_str(), p.benchmark.indicator))
      .collect();
    assert_eq!(
      indicators,
      vec![
        ("r1", Some(Indicator::Matchday(-2))),
        ("r2", Some(Indicator::Matchday(-1))),
      ]
    );
  }

  #[test]
  fn test_settle_merges_patches_per_event() {
    let events = vec![mock_training("t", 0)];
    let mut recalculation = Recalculation::default();
    recalculation.patch(
      "t",
      BenchmarkPatch {
        indicator: Some(Indicator::NoCategory),
        ..Default::default()
      },
    );
    let mut aggregate = BenchmarkAggregate::default();
    aggregate.team.intensity = 1.0;
    recalculation.patch(
      "t",
      BenchmarkPatch {
        aggregate: Some(aggregate.clone()),
        ..Default::default()
      },
    );

    let patches = settle(&events, recalculation, &config());

    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].benchmark.indicator, Some(Indicator::NoCategory));
    assert_eq!(patches[0].benchmark.aggregate, Some(aggregate));
  }

  #[test]
  fn test_settle_stops_after_round_limit() {
    let events = vec![mock_match("m", 0), mock_training("t", 1)];
    let config = BenchmarkConfig {
      max_settle_rounds: 0,
      ..BenchmarkConfig::default()
    };
    let recalculation = Recalculation {
      patches: Vec::new(),
      follow_ups: vec![FollowUp::RecategorizeAround { date: day(0) }],
    };

    assert!(settle(&events, recalculation, &config).is_empty());
  }

  #[test]
  fn test_empty_recalculation_is_a_noop() {
    let events = md_minus_one_history();
    let recalculation = on_delete(&[], &events, &config());

    assert!(recalculation.is_empty());
    assert!(settle(&events, recalculation, &config()).is_empty());
  }

  #[test]
  fn test_relabelled_source_feeds_its_new_group() {
    // Arrange: upcoming targets in both the MD-1 and MD-3 groups
    let mut events = md_minus_one_history();
    events.push(with_indicator(finished_training("f-md3", 30, 300.0), Indicator::Matchday(-3)));
    events.push(with_indicator(mock_training("next-md1", 21), Indicator::Matchday(-1)));
    events.push(with_indicator(mock_training("next-md3", 40), Indicator::Matchday(-3)));
    let previous = find(&events, "f1").clone();

    // Act: the finished 100-load session is pinned to MD-3
    let idx = events.iter().position(|e| e.id == "f1").unwrap();
    events[idx] = with_manual_indicator(previous.clone(), Indicator::Matchday(-3));
    let recalculation = on_update(&previous, &events, &config());
    let patches = settle(&events, recalculation, &config());
    apply(&mut events, &patches);

    // Assert
    assert!(patches.iter().any(|p| p.event_id == "next-md3"));
    assert_approx_eq!(intensity(&events, "next-md3"), (300.0 + 100.0) / 2.0, 1e-9);
    assert_approx_eq!(intensity(&events, "next-md1"), (120.0 + 140.0) / 2.0, 1e-9);
  }

  #[test]
  fn test_recategorize_window_is_inclusive() {
    // Arrange: stale MD-1 labels just inside and just outside the window
    let events = vec![
      with_indicator(mock_training("before-15", -15), Indicator::Matchday(-1)),
      with_indicator(mock_training("before-14", -14), Indicator::Matchday(-1)),
      mock_match("m", 0),
      with_indicator(mock_training("after-14", 14), Indicator::Matchday(-1)),
      with_indicator(mock_training("after-15", 15), Indicator::Matchday(-1)),
    ];
    assert_eq!(config().match_window_days, 14);

    // Act
    let patches = recategorize_around(day(0), &events, &config());

    // Assert
    let ids: Vec<_> = patches.iter().map(|p| p.event_id.as_str()).collect();
    assert_eq!(ids, vec!["before-14", "after-14"]);
    assert!(patches
      .iter()
      .all(|p| p.benchmark.indicator == Some(Indicator::NoCategory)));
  }

  #[test]
  fn test_individual_session_is_never_recategorized() {
    // Arrange
    let mut events = vec![
      mock_match("m0", 0),
      with_indicator(mock_training("solo", 5), Indicator::Individual),
    ];
    events.push(mock_match("m1", 7));

    // Act: a match lands right next to it
    let recalculation = on_create(&["m1".to_string()], &events, &config());
    let patches = settle(&events, recalculation, &config());

    // Assert
    assert!(patches.is_empty());

    // Act: the session itself moves
    let previous = find(&events, "solo").clone();
    let idx = events.iter().position(|e| e.id == "solo").unwrap();
    events[idx].date = day(6);
    let recalculation = on_update(&previous, &events, &config());
    let patches = settle(&events, recalculation, &config());
    apply(&mut events, &patches);

    // Assert
    assert_eq!(find(&events, "solo").stored_indicator(), Some(Indicator::Individual));
  }
}
