//! Store-facing commands
//!
//! Each command writes the mutation, snapshots the store, runs the matching
//! orchestrator handler through `settle`, and writes the resulting benchmark
//! patches back. Writes are last-write-wins; two commands racing on the same
//! store may each settle against a snapshot the other has already changed.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::BenchmarkConfig;
use crate::error::{BenchmarkError, Result};
use crate::models::{Benchmark, Event, EventId, EventPatch, Indicator, NewEvent};
use crate::orchestrator::{on_create, on_delete, on_update, settle, Recalculation};
use crate::store::EventStore;

/// What a command touched: the events it wrote and the benchmark patches
/// that followed from it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkUpdate {
  pub event_ids: Vec<EventId>,
  pub patches: Vec<EventPatch>,
}

/// Parse a wire indicator (`-3`, `no_category`, `individual`)
pub fn parse_indicator(raw: &str) -> Result<Indicator> {
  raw
    .trim()
    .parse::<Indicator>()
    .map_err(BenchmarkError::InvalidIndicator)
}

/// Settle a recalculation against `snapshot` and persist its patches
async fn write_back<S: EventStore>(
  store: &S,
  snapshot: &[Event],
  recalculation: Recalculation,
  config: &BenchmarkConfig,
) -> Result<Vec<EventPatch>> {
  if recalculation.is_empty() {
    return Ok(Vec::new());
  }

  let patches = settle(snapshot, recalculation, config);
  if !patches.is_empty() {
    let written = store.apply_patches(&patches).await?;
    info!(patches = patches.len(), written, "benchmark patches written");
  }
  Ok(patches)
}

/// ---------------------------------------------------------------------------
/// Create
/// ---------------------------------------------------------------------------

pub async fn create_event<S: EventStore>(
  store: &S,
  event: NewEvent,
  config: &BenchmarkConfig,
) -> Result<BenchmarkUpdate> {
  create_events(store, vec![event], config).await
}

/// Batch or recurring creation: every event is inserted before the single
/// recalculation runs, so later occurrences see the earlier ones
pub async fn create_events<S: EventStore>(
  store: &S,
  events: Vec<NewEvent>,
  config: &BenchmarkConfig,
) -> Result<BenchmarkUpdate> {
  let mut event_ids = Vec::with_capacity(events.len());
  for event in events {
    event_ids.push(store.insert_event(event).await?);
  }
  info!(count = event_ids.len(), "events created");

  let snapshot = store.load_events().await?;
  let recalculation = on_create(&event_ids, &snapshot, config);
  let patches = write_back(store, &snapshot, recalculation, config).await?;

  Ok(BenchmarkUpdate { event_ids, patches })
}

/// ---------------------------------------------------------------------------
/// Update
/// ---------------------------------------------------------------------------

/// Replace a stored event with an edited version under the same id
pub async fn update_event<S: EventStore>(
  store: &S,
  event: Event,
  config: &BenchmarkConfig,
) -> Result<BenchmarkUpdate> {
  let previous = store.get_event(&event.id).await?;
  store.replace_event(&event).await?;
  info!(event_id = %event.id, "event updated");

  let snapshot = store.load_events().await?;
  let recalculation = on_update(&previous, &snapshot, config);
  let patches = write_back(store, &snapshot, recalculation, config).await?;

  Ok(BenchmarkUpdate {
    event_ids: vec![event.id],
    patches,
  })
}

/// Pin a training to `indicator`, or with `None` hand it back to automatic
/// classification
pub async fn set_manual_indicator<S: EventStore>(
  store: &S,
  event_id: &str,
  indicator: Option<Indicator>,
  config: &BenchmarkConfig,
) -> Result<BenchmarkUpdate> {
  let mut event = store.get_event(event_id).await?;
  if event.is_match() {
    return Err(BenchmarkError::InvalidIndicator(format!(
      "{} is a match and cannot carry a training indicator",
      event_id
    )));
  }

  let benchmark = event.benchmark.get_or_insert_with(Benchmark::default);
  match indicator {
    Some(indicator) => {
      benchmark.indicator = Some(indicator);
      benchmark.manual_indicator = true;
    }
    None => {
      // Dropping the stored value lets an individual session be reclassified too
      benchmark.indicator = None;
      benchmark.manual_indicator = false;
    }
  }

  update_event(store, event, config).await
}

/// ---------------------------------------------------------------------------
/// Delete
/// ---------------------------------------------------------------------------

pub async fn delete_event<S: EventStore>(
  store: &S,
  event_id: &str,
  config: &BenchmarkConfig,
) -> Result<BenchmarkUpdate> {
  // Fail before removing anything so a bad id leaves the store untouched
  store.get_event(event_id).await?;
  delete_events(store, &[event_id.to_string()], config).await
}

/// Batch or recurring deletion. Ids that are already gone are skipped.
pub async fn delete_events<S: EventStore>(
  store: &S,
  event_ids: &[EventId],
  config: &BenchmarkConfig,
) -> Result<BenchmarkUpdate> {
  let mut removed = Vec::with_capacity(event_ids.len());
  for id in event_ids {
    match store.remove_event(id).await? {
      Some(event) => removed.push(event),
      None => warn!(event_id = %id, "delete skipped, event not found"),
    }
  }
  info!(count = removed.len(), "events deleted");

  let snapshot = store.load_events().await?;
  let recalculation = on_delete(&removed, &snapshot, config);
  let patches = write_back(store, &snapshot, recalculation, config).await?;

  Ok(BenchmarkUpdate {
    event_ids: removed.into_iter().map(|e| e.id).collect(),
    patches,
  })
}
