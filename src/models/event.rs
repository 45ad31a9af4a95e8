use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Benchmark, EventId, Indicator, PlayerId, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
  Match,
  Training,
}

impl std::fmt::Display for EventType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Match => write!(f, "match"),
      Self::Training => write!(f, "training"),
    }
  }
}

impl std::str::FromStr for EventType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "match" => Ok(Self::Match),
      "training" => Ok(Self::Training),
      _ => Err(format!("Unknown event type: {}", s)),
    }
  }
}

/// Session status, present once the event has started
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatus {
  #[serde(default)]
  pub is_final: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub started_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ended_at: Option<DateTime<Utc>>,
}

/// Roster split for an event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preparation {
  #[serde(default)]
  pub players_in_pitch: Vec<PlayerId>,
  #[serde(default)]
  pub players_on_bench: Vec<PlayerId>,
}

impl Preparation {
  pub fn includes(&self, player_id: &str) -> bool {
    self.players_in_pitch.iter().any(|p| p == player_id)
      || self.players_on_bench.iter().any(|p| p == player_id)
  }
}

/// A scheduled match or training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub id: EventId,
  #[serde(rename = "type")]
  pub event_type: EventType,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_time: Option<NaiveTime>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date_utc: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<EventStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub report: Option<Report>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub benchmark: Option<Benchmark>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preparation: Option<Preparation>,
}

impl Event {
  pub fn is_match(&self) -> bool {
    self.event_type == EventType::Match
  }

  pub fn is_training(&self) -> bool {
    self.event_type == EventType::Training
  }

  pub fn is_final(&self) -> bool {
    self.status.as_ref().is_some_and(|s| s.is_final)
  }

  pub fn has_report(&self) -> bool {
    self.report.is_some()
  }

  /// Finished with a report: contributes to sibling aggregates
  pub fn is_benchmark_source(&self) -> bool {
    self.is_training() && self.is_final() && self.has_report()
  }

  /// Still waiting for its own session: its aggregate follows the siblings
  pub fn is_benchmark_target(&self) -> bool {
    self.is_training() && !self.is_final() && !self.has_report() && !self.has_pinned_indicator()
  }

  pub fn has_manual_indicator(&self) -> bool {
    self.benchmark.as_ref().is_some_and(|b| b.manual_indicator)
  }

  /// Manual overrides and individual sessions are never derived from dates
  pub fn has_pinned_indicator(&self) -> bool {
    self.has_manual_indicator() || self.stored_indicator() == Some(Indicator::Individual)
  }

  pub fn stored_indicator(&self) -> Option<Indicator> {
    self.benchmark.as_ref().and_then(|b| b.indicator)
  }

  pub fn apply_patch(&mut self, patch: &super::BenchmarkPatch) {
    self.benchmark.get_or_insert_with(Benchmark::default).merge(patch);
  }

  /// The stored document without its id
  pub fn to_new_event(&self) -> NewEvent {
    NewEvent {
      event_type: self.event_type,
      date: self.date,
      start_time: self.start_time,
      date_utc: self.date_utc,
      status: self.status.clone(),
      report: self.report.clone(),
      benchmark: self.benchmark.clone(),
      preparation: self.preparation.clone(),
    }
  }
}

/// An event before the store has assigned it an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
  #[serde(rename = "type")]
  pub event_type: EventType,
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_time: Option<NaiveTime>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date_utc: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<EventStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub report: Option<Report>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub benchmark: Option<Benchmark>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preparation: Option<Preparation>,
}

impl NewEvent {
  pub fn new(event_type: EventType, date: NaiveDate) -> Self {
    Self {
      event_type,
      date,
      start_time: None,
      date_utc: None,
      status: None,
      report: None,
      benchmark: None,
      preparation: None,
    }
  }

  pub fn into_event(self, id: EventId) -> Event {
    Event {
      id,
      event_type: self.event_type,
      date: self.date,
      start_time: self.start_time,
      date_utc: self.date_utc,
      status: self.status,
      report: self.report,
      benchmark: self.benchmark,
      preparation: self.preparation,
    }
  }
}
