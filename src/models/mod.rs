pub mod benchmark;
pub mod event;
pub mod report;

pub use benchmark::{
  AggregateStats, Benchmark, BenchmarkAggregate, BenchmarkPatch, EventPatch, Indicator,
};
pub use event::{Event, EventStatus, EventType, NewEvent, Preparation};
pub use report::{PlayerLoad, Report, SessionReport, SessionStats, ZoneBuckets};

/// Store-assigned event document id
pub type EventId = String;
/// Player document id
pub type PlayerId = String;
