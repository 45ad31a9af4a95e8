use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::PlayerId;

/// Five named buckets shared by intensity zones and action counts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneBuckets {
  pub explosive: f64,
  pub high: f64,
  pub low: f64,
  pub very_high: f64,
  pub moderate: f64,
}

impl ZoneBuckets {
  /// Add `other / divisor` to every bucket, in declaration order
  pub fn add_scaled(&mut self, other: &ZoneBuckets, divisor: f64) {
    self.explosive += other.explosive / divisor;
    self.high += other.high / divisor;
    self.low += other.low / divisor;
    self.very_high += other.very_high / divisor;
    self.moderate += other.moderate / divisor;
  }

  pub fn add(&mut self, other: &ZoneBuckets) {
    self.explosive += other.explosive;
    self.high += other.high;
    self.low += other.low;
    self.very_high += other.very_high;
    self.moderate += other.moderate;
  }

  /// Divide every bucket by `divisor`; a zero divisor yields zeroes
  pub fn divided_by(&self, divisor: f64) -> ZoneBuckets {
    if divisor == 0.0 {
      return ZoneBuckets::default();
    }
    ZoneBuckets {
      explosive: self.explosive / divisor,
      high: self.high / divisor,
      low: self.low / divisor,
      very_high: self.very_high / divisor,
      moderate: self.moderate / divisor,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLoad {
  pub total: f64,
  #[serde(rename = "pMinute")]
  pub p_minute: f64,
}

/// Measured statistics for one session slice
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub player_load: Option<PlayerLoad>,
  #[serde(default)]
  pub intensity_zones: ZoneBuckets,
  #[serde(default)]
  pub actions: ZoneBuckets,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub full_session: Option<SessionStats>,
}

impl SessionReport {
  /// Full-session stats, only when they carry a player load
  pub fn loaded_session(&self) -> Option<(&SessionStats, PlayerLoad)> {
    let stats = self.full_session.as_ref()?;
    stats.player_load.map(|load| (stats, load))
  }
}

/// Final report attached to a finished event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub team: Option<SessionReport>,
  #[serde(default)]
  pub players: BTreeMap<PlayerId, SessionReport>,
}

impl Report {
  /// Team full-session stats, or `None` when the report can't be used as a sample
  pub fn team_session(&self) -> Option<(&SessionStats, PlayerLoad)> {
    self.team.as_ref()?.loaded_session()
  }
}
