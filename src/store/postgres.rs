//! PostgreSQL event store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Executor, Row};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::types::{Event, EventId};
use super::{EventStore, EventWriter};

/// DDL for the events table.
pub const EVENTS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id           UUID PRIMARY KEY,
    name         TEXT NOT NULL,
    start_time   TIMESTAMPTZ NOT NULL,
    end_time     TIMESTAMPTZ NOT NULL,
    parent_id    UUID NULL,
    description  TEXT NULL,
    metadata     JSONB NOT NULL DEFAULT '{}'::jsonb,
    CHECK (end_time > start_time)
);
CREATE INDEX IF NOT EXISTS idx_events_start_time ON events (start_time, id);
CREATE INDEX IF NOT EXISTS idx_events_parent_id ON events (parent_id);
"#;

const EVENT_COLUMNS: &str = "id, name, start_time, end_time, parent_id, description, metadata";

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800).
    pub max_lifetime_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/temporal".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored row violates the event invariants.
    #[error("Invalid event row {id}: {source}")]
    InvalidRow {
        /// Row ID.
        id: Uuid,
        /// Validation failure.
        source: AnalysisError,
    },
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// PostgreSQL event store.
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, sqlx::Error> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, sqlx::Error> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create the events table and indexes if missing.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        self.pool.execute(EVENTS_TABLE_SCHEMA).await?;
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    fn parse_event_row(row: &PgRow) -> Result<Event, PostgresError> {
        let id: Uuid = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let start: DateTime<Utc> = row.try_get("start_time")?;
        let end: DateTime<Utc> = row.try_get("end_time")?;
        let parent_id: Option<Uuid> = row.try_get("parent_id")?;
        let description: Option<String> = row.try_get("description")?;
        let metadata: Option<serde_json::Value> = row.try_get("metadata")?;

        let mut event = Event::new(EventId::new(id), name, start, end)
            .map_err(|source| PostgresError::InvalidRow { id, source })?;
        event.parent_id = parent_id.map(EventId::new);
        event.description = description;
        if let Some(serde_json::Value::Object(map)) = metadata {
            event.metadata = map.into_iter().collect::<BTreeMap<_, _>>();
        }
        Ok(event)
    }

    fn parse_rows(rows: &[PgRow]) -> Result<Vec<Event>, PostgresError> {
        rows.iter().map(Self::parse_event_row).collect()
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    type Error = PostgresError;

    async fn get_all_events(&self) -> Result<Vec<Event>, Self::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Self::parse_rows(&rows)
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, Self::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_event_row).transpose()
    }

    async fn get_child_events(&self, parent_id: &EventId) -> Result<Vec<Event>, Self::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events WHERE parent_id = $1 ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .bind(parent_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Self::parse_rows(&rows)
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl EventWriter for PostgresEventStore {
    async fn insert_events(&self, events: &[Event]) -> Result<usize, Self::Error> {
        let mut tx = self.pool.begin().await?;
        for event in events {
            sqlx::query(
                r#"
                INSERT INTO events (id, name, start_time, end_time, parent_id, description, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    start_time = EXCLUDED.start_time,
                    end_time = EXCLUDED.end_time,
                    parent_id = EXCLUDED.parent_id,
                    description = EXCLUDED.description,
                    metadata = EXCLUDED.metadata
                "#,
            )
            .bind(event.id.as_uuid())
            .bind(&event.name)
            .bind(event.start)
            .bind(event.end)
            .bind(event.parent_id.map(|p| p.as_uuid()))
            .bind(&event.description)
            .bind(sqlx::types::Json(&event.metadata))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(count = events.len(), "events written");
        Ok(events.len())
    }
}
