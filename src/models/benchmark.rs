//! Benchmark data attached to training events
//!
//! `Indicator` keeps the stored encoding exactly: integers -8..=3,
//! `"no_category"` and `"individual"`. Everything else in this module is the
//! averaged shape written back onto events.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::{EventId, PlayerId, ZoneBuckets};

/// Earliest matchday category (8 days before a match)
pub const MIN_MATCHDAY: i64 = -8;
/// Latest matchday category (3 days after a match)
pub const MAX_MATCHDAY: i64 = 3;

const NO_CATEGORY: &str = "no_category";
const INDIVIDUAL: &str = "individual";

/// ---------------------------------------------------------------------------
/// Indicator
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
  /// Signed distance to the nearest match, MD-8 through MD+3
  Matchday(i8),
  /// Too far from any match to compare against
  NoCategory,
  /// Individual training, assigned by the user and never computed
  Individual,
}

impl Indicator {
  /// Build a matchday indicator, or `None` if `days` is outside -8..=3
  pub fn matchday(days: i64) -> Option<Self> {
    if (MIN_MATCHDAY..=MAX_MATCHDAY).contains(&days) {
      Some(Indicator::Matchday(days as i8))
    } else {
      None
    }
  }

  /// Collapse out-of-range offsets to `NoCategory`
  pub fn from_days(days: i64) -> Self {
    Self::matchday(days).unwrap_or(Indicator::NoCategory)
  }

  /// Whether siblings in this group can be averaged against each other
  pub fn is_comparable(&self) -> bool {
    !matches!(self, Indicator::NoCategory)
  }

  pub fn label(&self) -> String {
    match self {
      Indicator::Matchday(0) => "MD".to_string(),
      Indicator::Matchday(n) if *n > 0 => format!("MD+{}", n),
      Indicator::Matchday(n) => format!("MD{}", n),
      Indicator::NoCategory => "No category".to_string(),
      Indicator::Individual => "Individual".to_string(),
    }
  }
}

impl fmt::Display for Indicator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Indicator::Matchday(n) => write!(f, "{}", n),
      Indicator::NoCategory => write!(f, "{}", NO_CATEGORY),
      Indicator::Individual => write!(f, "{}", INDIVIDUAL),
    }
  }
}

impl std::str::FromStr for Indicator {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      NO_CATEGORY => Ok(Indicator::NoCategory),
      INDIVIDUAL => Ok(Indicator::Individual),
      other => other
        .parse::<i64>()
        .ok()
        .and_then(Indicator::matchday)
        .ok_or_else(|| format!("Unknown indicator: {}", other)),
    }
  }
}

impl Serialize for Indicator {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match self {
      Indicator::Matchday(n) => serializer.serialize_i64(*n as i64),
      Indicator::NoCategory => serializer.serialize_str(NO_CATEGORY),
      Indicator::Individual => serializer.serialize_str(INDIVIDUAL),
    }
  }
}

struct IndicatorVisitor;

impl<'de> Visitor<'de> for IndicatorVisitor {
  type Value = Indicator;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "an integer in -8..=3, \"no_category\" or \"individual\"")
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<Indicator, E> {
    Indicator::matchday(v).ok_or_else(|| E::custom(format!("indicator out of range: {}", v)))
  }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<Indicator, E> {
    let v = i64::try_from(v).map_err(|_| E::custom("indicator out of range"))?;
    self.visit_i64(v)
  }

  fn visit_f64<E: de::Error>(self, v: f64) -> Result<Indicator, E> {
    if v.fract() != 0.0 {
      return Err(E::custom(format!("indicator is not a whole day: {}", v)));
    }
    self.visit_i64(v as i64)
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<Indicator, E> {
    v.parse().map_err(E::custom)
  }
}

impl<'de> Deserialize<'de> for Indicator {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_any(IndicatorVisitor)
  }
}

/// ---------------------------------------------------------------------------
/// Aggregates
/// ---------------------------------------------------------------------------

/// Averaged stats over similar sessions, for the team or a single player
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateStats {
  pub intensity: f64,
  pub load_per_min: f64,
  pub intensity_zones: ZoneBuckets,
  pub actions: ZoneBuckets,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkAggregate {
  #[serde(flatten)]
  pub team: AggregateStats,
  pub players: BTreeMap<PlayerId, AggregateStats>,
}

/// Derived benchmark stored on a training event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
  #[serde(default)]
  pub indicator: Option<Indicator>,
  #[serde(default)]
  pub manual_indicator: bool,
  #[serde(flatten)]
  pub aggregate: BenchmarkAggregate,
}

impl Benchmark {
  /// Shallow merge: only fields present in the patch are replaced
  pub fn merge(&mut self, patch: &BenchmarkPatch) {
    if let Some(indicator) = patch.indicator {
      self.indicator = Some(indicator);
    }
    if let Some(manual) = patch.manual_indicator {
      self.manual_indicator = manual;
    }
    if let Some(aggregate) = &patch.aggregate {
      self.aggregate = aggregate.clone();
    }
  }
}

/// ---------------------------------------------------------------------------
/// Patches
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub indicator: Option<Indicator>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub manual_indicator: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub aggregate: Option<BenchmarkAggregate>,
}

impl BenchmarkPatch {
  /// Fold a later patch into this one; later fields win
  pub fn absorb(&mut self, later: BenchmarkPatch) {
    if later.indicator.is_some() {
      self.indicator = later.indicator;
    }
    if later.manual_indicator.is_some() {
      self.manual_indicator = later.manual_indicator;
    }
    if later.aggregate.is_some() {
      self.aggregate = later.aggregate;
    }
  }
}

/// A benchmark patch addressed to one stored event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
  pub event_id: EventId,
  pub benchmark: BenchmarkPatch,
}
