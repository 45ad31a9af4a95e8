use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{info, warn};

use crate::config::BenchmarkConfig;
use crate::error::{BenchmarkError, Result};
use crate::models::{Event, EventId, EventPatch, NewEvent};
use crate::store::EventStore;

pub type DbPool = SqlitePool;

const DEFAULT_DATABASE_URL: &str = "sqlite://benchmark.db?mode=rwc";

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(config: &BenchmarkConfig) -> Result<DbPool> {
  let db_url = config
    .database_url
    .clone()
    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

  info!(url = %db_url, "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("database initialized");

  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// SQLite Event Store
/// ---------------------------------------------------------------------------

/// Events stored as JSON documents keyed by an integer rowid
pub struct SqliteEventStore {
  pool: DbPool,
}

impl SqliteEventStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> DbPool {
    self.pool.clone()
  }

  fn row_id(id: &str) -> Result<i64> {
    id.parse::<i64>()
      .map_err(|_| BenchmarkError::EventNotFound(id.to_string()))
  }

  async fn fetch_event(&self, id: &str) -> Result<Option<Event>> {
    let Ok(row_id) = Self::row_id(id) else {
      return Ok(None);
    };
    let body: Option<String> = sqlx::query_scalar("SELECT body_json FROM events WHERE id = ?")
      .bind(row_id)
      .fetch_optional(&self.pool)
      .await?;

    body
      .map(|json| Self::decode(row_id, &json))
      .transpose()
  }

  fn decode(row_id: i64, json: &str) -> Result<Event> {
    let new_event: NewEvent = serde_json::from_str(json)?;
    Ok(new_event.into_event(row_id.to_string()))
  }

  fn encode(event: &Event) -> Result<String> {
    Ok(serde_json::to_string(&event.to_new_event())?)
  }

  async fn write_event(&self, event: &Event) -> Result<u64> {
    let result = sqlx::query(
      r#"
      UPDATE events
      SET event_type = ?, date = ?, body_json = ?, updated_at = ?
      WHERE id = ?
      "#,
    )
    .bind(event.event_type.to_string())
    .bind(event.date.to_string())
    .bind(Self::encode(event)?)
    .bind(Utc::now().to_rfc3339())
    .bind(Self::row_id(&event.id)?)
    .execute(&self.pool)
    .await?;

    Ok(result.rows_affected())
  }
}

impl EventStore for SqliteEventStore {
  async fn load_events(&self) -> Result<Vec<Event>> {
    let rows = sqlx::query("SELECT id, body_json FROM events ORDER BY date, id")
      .fetch_all(&self.pool)
      .await?;

    rows
      .iter()
      .map(|row| Self::decode(row.get("id"), &row.get::<String, _>("body_json")))
      .collect()
  }

  async fn insert_event(&self, event: NewEvent) -> Result<EventId> {
    let body = serde_json::to_string(&event)?;
    let result = sqlx::query(
      r#"
      INSERT INTO events (event_type, date, body_json, updated_at)
      VALUES (?, ?, ?, ?)
      "#,
    )
    .bind(event.event_type.to_string())
    .bind(event.date.to_string())
    .bind(&body)
    .bind(Utc::now().to_rfc3339())
    .execute(&self.pool)
    .await?;

    Ok(result.last_insert_rowid().to_string())
  }

  async fn replace_event(&self, event: &Event) -> Result<()> {
    if self.write_event(event).await? == 0 {
      return Err(BenchmarkError::EventNotFound(event.id.clone()));
    }
    Ok(())
  }

  async fn remove_event(&self, id: &str) -> Result<Option<Event>> {
    let Some(event) = self.fetch_event(id).await? else {
      return Ok(None);
    };
    sqlx::query("DELETE FROM events WHERE id = ?")
      .bind(Self::row_id(id)?)
      .execute(&self.pool)
      .await?;
    Ok(Some(event))
  }

  async fn apply_patches(&self, patches: &[EventPatch]) -> Result<usize> {
    let mut written = 0;
    for patch in patches {
      let Some(mut event) = self.fetch_event(&patch.event_id).await? else {
        warn!(event_id = %patch.event_id, "skipping patch for missing event");
        continue;
      };
      event.apply_patch(&patch.benchmark);
      written += self.write_event(&event).await? as usize;
    }
    Ok(written)
  }

  async fn get_event(&self, id: &str) -> Result<Event> {
    self
      .fetch_event(id)
      .await?
      .ok_or_else(|| BenchmarkError::EventNotFound(id.to_string()))
  }
}
