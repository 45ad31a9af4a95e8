//! Category classifier
//!
//! Turns the pair of match distances into one matchday indicator:
//! - the side with the smaller absolute offset wins, ties go forward
//! - 3 days after vs 4 days before counts down to the next match (-4)
//! - 3 days either side is -3
//! - anything outside MD-8..MD+3, or with no match at all, is no category

use tracing::debug;

use crate::distance::{resolve_match_distances, sort_events, MatchDistances};
use crate::models::{Event, EventId, Indicator};

pub fn classify(distances: MatchDistances) -> Indicator {
  let (past, next) = (distances.past.days(), distances.next.days());

  match (past, next) {
    (Some(3), Some(-4)) => return Indicator::Matchday(-4),
    (Some(3), Some(-3)) => return Indicator::Matchday(-3),
    _ => {}
  }

  let chosen = match (past, next) {
    (Some(p), Some(n)) => {
      if p.abs() < n.abs() {
        p
      } else {
        n
      }
    }
    (Some(p), None) => p,
    (None, Some(n)) => n,
    (None, None) => return Indicator::NoCategory,
  };

  Indicator::from_days(chosen)
}

/// Date-derived indicator for the event at `index`, ignoring anything stored.
///
/// `events` must be sorted.
pub fn computed_indicator(events: &[Event], index: usize) -> Indicator {
  classify(resolve_match_distances(events, index))
}

/// The indicator an event is grouped under.
///
/// A manual override or an individual session always wins. A finished
/// session keeps the group it was stored with, so moving matches later never
/// reshuffles history. Everything else is derived from the surrounding matches.
pub fn effective_indicator(events: &[Event], index: usize) -> Indicator {
  let event = &events[index];
  match event.stored_indicator() {
    Some(stored) if event.has_pinned_indicator() => stored,
    Some(stored) if event.is_final() => stored,
    _ => computed_indicator(events, index),
  }
}

/// Indicator for every training event in the snapshot
pub fn categorize_training_events(events: &[Event]) -> Vec<(EventId, Indicator)> {
  let mut sorted = events.to_vec();
  sort_events(&mut sorted);

  sorted
    .iter()
    .enumerate()
    .filter(|(_, e)| e.is_training())
    .map(|(idx, e)| {
      let indicator = effective_indicator(&sorted, idx);
      debug!(event_id = %e.id, date = %e.date, indicator = %indicator, "categorized training");
      (e.id.clone(), indicator)
    })
    .collect()
}
