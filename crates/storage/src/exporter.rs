//! Export sinks
//!
//! Persists discovered instances and moderation events. The database sink
//! upserts on the natural keys (`hostname` for instances,
//! `(source_instance, target_instance)` for events), so re-exporting the
//! same crawl produces no duplicate rows. The JSONL sink writes a
//! line-delimited snapshot for downstream tooling.

use crate::database::{schema_migrations, DatabaseConfig, DatabaseError, SqliteDatabase};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use collector::ModerationEvent;
use mastodon_client::blocklist::BlockSeverity;
use mastodon_client::directory::InstanceRecord;
use sqlx::Row;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Export error types
#[derive(Debug, Error)]
pub enum ExportError {
    /// Database-level failure
    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),

    /// Query-level failure
    #[error("Storage error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// File sink IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored row contents that cannot be decoded
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Counts reported by a sink after an export pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    /// Instance rows written or refreshed
    pub instances_written: u64,
    /// Event rows written or refreshed
    pub events_written: u64,
}

/// A destination for crawl results
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Persist the given instances and events
    async fn export(
        &self,
        instances: &[InstanceRecord],
        events: &[ModerationEvent],
    ) -> Result<ExportStats>;
}

// =============================================================================
// SQLite sink
// =============================================================================

/// Database sink with insert-or-update semantics
pub struct SqliteExporter {
    db: SqliteDatabase,
}

impl SqliteExporter {
    /// Open (or create) a database file and apply the schema
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        let db = SqliteDatabase::new(config).await?;
        db.migrate(&schema_migrations()).await?;
        Ok(Self { db })
    }

    /// Create an in-memory sink with the schema applied (for testing)
    pub async fn in_memory() -> Result<Self> {
        let db = SqliteDatabase::in_memory().await?;
        db.migrate(&schema_migrations()).await?;
        Ok(Self { db })
    }

    /// Access the underlying database
    pub fn database(&self) -> &SqliteDatabase {
        &self.db
    }

    /// Upsert discovered instances keyed on hostname
    pub async fn upsert_instances(&self, instances: &[InstanceRecord]) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let mut written = 0;

        for instance in instances {
            let metadata = serde_json::to_string(&instance.metadata)?;

            sqlx::query(
                "INSERT INTO instances (hostname, metadata, first_seen, last_seen)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(hostname) DO UPDATE SET
                     metadata = excluded.metadata,
                     last_seen = excluded.last_seen",
            )
            .bind(&instance.name)
            .bind(&metadata)
            .bind(&now)
            .bind(&now)
            .execute(self.db.pool())
            .await?;

            written += 1;
        }

        Ok(written)
    }

    /// Upsert moderation events keyed on (source_instance, target_instance)
    ///
    /// A repeated observation of the same pair updates severity, reason, and
    /// observed_at in place. Rows are never deleted.
    pub async fn upsert_events(&self, events: &[ModerationEvent]) -> Result<u64> {
        let mut written = 0;

        for event in events {
            sqlx::query(
                "INSERT INTO moderation_events
                     (source_instance, target_instance, severity, reason, observed_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(source_instance, target_instance) DO UPDATE SET
                     severity = excluded.severity,
                     reason = excluded.reason,
                     observed_at = excluded.observed_at",
            )
            .bind(&event.source_instance)
            .bind(&event.target_instance)
            .bind(event.severity.as_str())
            .bind(&event.reason)
            .bind(event.observed_at.to_rfc3339())
            .execute(self.db.pool())
            .await?;

            written += 1;
        }

        Ok(written)
    }

    /// Number of event rows currently stored
    pub async fn event_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM moderation_events")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Fetch all stored events, ordered by natural key
    pub async fn fetch_events(&self) -> Result<Vec<ModerationEvent>> {
        let rows = sqlx::query(
            "SELECT source_instance, target_instance, severity, reason, observed_at
             FROM moderation_events
             ORDER BY source_instance, target_instance",
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let source_instance: String = row.get("source_instance");
            let target_instance: String = row.get("target_instance");
            let severity: String = row.get("severity");
            let raw_observed_at: String = row.get("observed_at");
            let observed_at = DateTime::parse_from_rfc3339(&raw_observed_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    ExportError::Corrupt(format!(
                        "invalid observed_at '{}' for {} -> {}: {}",
                        raw_observed_at, source_instance, target_instance, e
                    ))
                })?;

            events.push(ModerationEvent {
                source_instance,
                target_instance,
                severity: BlockSeverity::from_str(&severity),
                reason: row.get("reason"),
                observed_at,
            });
        }

        Ok(events)
    }
}

#[async_trait]
impl EventSink for SqliteExporter {
    async fn export(
        &self,
        instances: &[InstanceRecord],
        events: &[ModerationEvent],
    ) -> Result<ExportStats> {
        let instances_written = self.upsert_instances(instances).await?;
        let events_written = self.upsert_events(events).await?;

        tracing::info!(instances_written, events_written, "Database export complete");

        Ok(ExportStats {
            instances_written,
            events_written,
        })
    }
}

// =============================================================================
// JSONL sink
// =============================================================================

/// File sink writing one event per line as JSON
///
/// The file is rewritten on every export, so a re-run yields the same file
/// rather than appended duplicates.
pub struct JsonlExporter {
    path: PathBuf,
}

impl JsonlExporter {
    /// Create a sink writing to the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventSink for JsonlExporter {
    async fn export(
        &self,
        _instances: &[InstanceRecord],
        events: &[ModerationEvent],
    ) -> Result<ExportStats> {
        let mut buffer = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buffer, event)?;
            buffer.push(b'\n');
        }

        let mut file = tokio::fs::File::create(&self.path).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;

        tracing::info!(path = %self.path.display(), events = events.len(), "JSONL export complete");

        Ok(ExportStats {
            instances_written: 0,
            events_written: events.len() as u64,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
