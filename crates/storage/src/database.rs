//! Database layer
//!
//! SQLite with connection pooling and versioned migrations. The schema holds
//! two tables: `instances` (discovered hostnames plus opaque directory
//! metadata) and `moderation_events` (one row per observed
//! source/target pair).

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: String,
    /// Maximum number of connections in pool
    pub max_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Enable WAL mode
    pub wal_mode: bool,
    /// Synchronous mode
    pub synchronous: SynchronousMode,
}

/// SQLite synchronous mode
#[derive(Debug, Clone, Copy)]
pub enum SynchronousMode {
    /// Off - no synchronization
    Off,
    /// Normal - synchronize at critical moments
    Normal,
    /// Full - synchronize after each write
    Full,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "netmod.db".to_string(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
            wal_mode: true,
            synchronous: SynchronousMode::Normal,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable WAL mode
    pub fn wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    /// Set synchronous mode
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }
}

/// SQLite database with pooled connections
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Create a new SQLite database with configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path))
            .map_err(|e| DatabaseError::Config(e.to_string()))?
            .create_if_missing(true);

        if config.wal_mode {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        options = match config.synchronous {
            SynchronousMode::Off => options.synchronous(SqliteSynchronous::Off),
            SynchronousMode::Normal => options.synchronous(SqliteSynchronous::Normal),
            SynchronousMode::Full => options.synchronous(SqliteSynchronous::Full),
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run migrations
    pub async fn migrate(&self, migrations: &[MigrationDefinition]) -> Result<()> {
        // Ensure migrations table exists
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                checksum TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
                .fetch_optional(&self.pool)
                .await?
                .flatten();

        let current_version = current_version.unwrap_or(0);

        for migration in migrations {
            if migration.version > current_version {
                tracing::info!(
                    "Applying migration {} - {}",
                    migration.version,
                    migration.description
                );

                let mut tx = self.pool.begin().await?;

                sqlx::query(&migration.sql).execute(&mut *tx).await?;

                sqlx::query(
                    "INSERT INTO _migrations (version, description, checksum) VALUES (?, ?, ?)",
                )
                .bind(migration.version)
                .bind(&migration.description)
                .bind(&migration.checksum)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
            }
        }

        Ok(())
    }

    /// Get current migration version
    pub async fn current_version(&self) -> Result<i64> {
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_optional(&self.pool)
            .await?
            .flatten();

        Ok(version.unwrap_or(0))
    }

    /// Check if the database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Migration definition
#[derive(Debug, Clone)]
pub struct MigrationDefinition {
    /// Migration version number
    pub version: i64,
    /// Migration description
    pub description: String,
    /// SQL to execute (a single statement)
    pub sql: String,
    /// Checksum for verification
    pub checksum: String,
}

impl MigrationDefinition {
    /// Create a new migration definition
    pub fn new(version: i64, description: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let checksum = format!("{:x}", md5::compute(&sql));

        Self {
            version,
            description: description.into(),
            sql,
            checksum,
        }
    }
}

/// Schema migrations for the collector tables
pub fn schema_migrations() -> Vec<MigrationDefinition> {
    vec![
        MigrationDefinition::new(
            1,
            "Create instances table",
            "CREATE TABLE instances (
                hostname TEXT PRIMARY KEY,
                metadata TEXT NOT NULL DEFAULT '{}',
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL
            )",
        ),
        MigrationDefinition::new(
            2,
            "Create moderation events table",
            "CREATE TABLE moderation_events (
                source_instance TEXT NOT NULL,
                target_instance TEXT NOT NULL,
                severity TEXT NOT NULL,
                reason TEXT,
                observed_at TEXT NOT NULL,
                PRIMARY KEY (source_instance, target_instance)
            )",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_database_creation() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        assert!(db.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_schema_migrations() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        db.migrate(&schema_migrations()).await.unwrap();

        let version = db.current_version().await.unwrap();
        assert_eq!(version, 2);

        let row = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='moderation_events'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        let table_name: String = row.get("name");
        assert_eq!(table_name, "moderation_events");
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.migrate(&schema_migrations()).await.unwrap();
        let version1 = db.current_version().await.unwrap();

        // Run again - should be a no-op
        db.migrate(&schema_migrations()).await.unwrap();
        let version2 = db.current_version().await.unwrap();

        assert_eq!(version1, version2);
    }

    #[tokio::test]
    async fn test_natural_key_enforced() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        db.migrate(&schema_migrations()).await.unwrap();

        sqlx::query(
            "INSERT INTO moderation_events
             (source_instance, target_instance, severity, observed_at)
             VALUES ('a.example', 'b.example', 'suspend', '2024-11-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        // A second plain insert for the same pair must violate the key
        let duplicate = sqlx::query(
            "INSERT INTO moderation_events
             (source_instance, target_instance, severity, observed_at)
             VALUES ('a.example', 'b.example', 'silence', '2024-11-02T00:00:00Z')",
        )
        .execute(db.pool())
        .await;

        assert!(duplicate.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("test.db")
            .max_connections(3)
            .connect_timeout(Duration::from_secs(10))
            .wal_mode(true)
            .synchronous(SynchronousMode::Full);

        assert_eq!(config.path, "test.db");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.wal_mode);
        assert!(matches!(config.synchronous, SynchronousMode::Full));
    }
}
