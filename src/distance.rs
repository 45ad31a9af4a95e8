//! Date/match-distance resolver
//!
//! Finds, for a training event, the nearest match on either side in a
//! chronologically sorted event list and expresses both as whole-day offsets.

use chrono::NaiveDate;

use crate::models::Event;

/// Whole-day distance to a match, or no match on that side at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDistance {
  Days(i64),
  None,
}

impl MatchDistance {
  pub fn days(&self) -> Option<i64> {
    match self {
      MatchDistance::Days(d) => Some(*d),
      MatchDistance::None => None,
    }
  }

  /// Absolute distance; a missing match sorts after every real one
  pub fn magnitude(&self) -> Option<i64> {
    self.days().map(i64::abs)
  }
}

/// Distances to the surrounding matches.
///
/// `past` is non-negative (days since the previous match), `next` is
/// non-positive (negated days until the following match).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDistances {
  pub past: MatchDistance,
  pub next: MatchDistance,
}

/// Sort by `(date, start_time)`; events without a start time lead their day.
/// The sort is stable, so insertion order breaks any remaining tie.
pub fn sort_events(events: &mut [Event]) {
  events.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
}

/// Sorted copy of a snapshot
pub fn sorted(events: &[Event]) -> Vec<Event> {
  let mut events = events.to_vec();
  sort_events(&mut events);
  events
}

/// Whole days from `from` to `to` (calendar dates, so time of day never matters)
pub fn day_distance(from: NaiveDate, to: NaiveDate) -> i64 {
  (to - from).num_days()
}

/// Scan outward from `index` for the first match on each side.
///
/// `events` must already be sorted with [`sort_events`].
pub fn resolve_match_distances(events: &[Event], index: usize) -> MatchDistances {
  let target = &events[index];

  let past = events[..index]
    .iter()
    .rev()
    .find(|e| e.is_match())
    .map(|m| MatchDistance::Days(day_distance(m.date, target.date)))
    .unwrap_or(MatchDistance::None);

  let next = events[index + 1..]
    .iter()
    .find(|e| e.is_match())
    .map(|m| MatchDistance::Days(-day_distance(target.date, m.date)))
    .unwrap_or(MatchDistance::None);

  MatchDistances { past, next }
}
