//! Event store collaborator
//!
//! The engine never owns persistence. Callers hand it snapshots taken from an
//! `EventStore` and write the resulting patches back through the same store.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{BenchmarkError, Result};
use crate::models::{Event, EventId, EventPatch, NewEvent};

#[allow(async_fn_in_trait)]
pub trait EventStore {
  /// Every stored event, in any order
  async fn load_events(&self) -> Result<Vec<Event>>;

  /// Persist a new event and return its assigned id
  async fn insert_event(&self, event: NewEvent) -> Result<EventId>;

  /// Overwrite a stored event wholesale
  async fn replace_event(&self, event: &Event) -> Result<()>;

  /// Remove an event, returning what was stored
  async fn remove_event(&self, id: &str) -> Result<Option<Event>>;

  /// Shallow-merge benchmark patches; returns how many events were written.
  /// Patches for events that no longer exist are skipped.
  async fn apply_patches(&self, patches: &[EventPatch]) -> Result<usize>;

  async fn get_event(&self, id: &str) -> Result<Event> {
    self
      .load_events()
      .await?
      .into_iter()
      .find(|e| e.id == id)
      .ok_or_else(|| BenchmarkError::EventNotFound(id.to_string()))
  }
}

/// ---------------------------------------------------------------------------
/// In-memory Store
/// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryEventStore {
  events: RwLock<Vec<Event>>,
  next_id: AtomicU64,
}

impl MemoryEventStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed with existing events, keeping their ids
  pub fn with_events(events: Vec<Event>) -> Self {
    Self {
      events: RwLock::new(events),
      next_id: AtomicU64::new(0),
    }
  }
}

impl EventStore for MemoryEventStore {
  async fn load_events(&self) -> Result<Vec<Event>> {
    Ok(self.events.read().await.clone())
  }

  async fn insert_event(&self, event: NewEvent) -> Result<EventId> {
    let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    self.events.write().await.push(event.into_event(id.clone()));
    Ok(id)
  }

  async fn replace_event(&self, event: &Event) -> Result<()> {
    let mut events = self.events.write().await;
    let stored = events
      .iter_mut()
      .find(|e| e.id == event.id)
      .ok_or_else(|| BenchmarkError::EventNotFound(event.id.clone()))?;
    *stored = event.clone();
    Ok(())
  }

  async fn remove_event(&self, id: &str) -> Result<Option<Event>> {
    let mut events = self.events.write().await;
    Ok(
      events
        .iter()
        .position(|e| e.id == id)
        .map(|idx| events.remove(idx)),
    )
  }

  async fn apply_patches(&self, patches: &[EventPatch]) -> Result<usize> {
    let mut events = self.events.write().await;
    let mut written = 0;
    for patch in patches {
      match events.iter_mut().find(|e| e.id == patch.event_id) {
        Some(event) => {
          event.apply_patch(&patch.benchmark);
          written += 1;
        }
        None => warn!(event_id = %patch.event_id, "skipping patch for missing event"),
      }
    }
    Ok(written)
  }
}
