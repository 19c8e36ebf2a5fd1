//! Storage implementations.
//!
//! - [`BatchStore`]: persists one batch of records as a single transaction
//! - [`sql::SqlBatchStore`]: sea-query/sqlx upsert store for SQLite and PostgreSQL
//! - [`mock::MockBatchStore`]: in-memory store for tests

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::{StorageConfig, StorageType};
use crate::model::Record;

pub mod mock;
pub mod schema;
pub mod sql;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Statement for record {index} failed: {source}")]
    Statement {
        index: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query build error: {0}")]
    Query(#[from] sea_query::error::Error),

    #[error("Collection row {index} does not match table {table} or its columns")]
    MixedCollection { table: String, index: usize },

    #[error("Storage backend '{0}' is not enabled in this build")]
    BackendDisabled(StorageType),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Conflict handling when a row's primary key already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictMode {
    /// Overwrite every data column with the incoming value.
    #[default]
    Upsert,
    /// Keep the existing row.
    Ignore,
}

impl ConflictMode {
    pub fn from_upsert(upsert: bool) -> Self {
        if upsert {
            ConflictMode::Upsert
        } else {
            ConflictMode::Ignore
        }
    }
}

/// Interface for batch persistence.
///
/// A batch is all-or-nothing: either every record is committed or none is.
///
/// Implementations:
/// - `SqlBatchStore<Sqlite>` / `SqlBatchStore<Postgres>`
/// - `MockBatchStore`: in-memory, with failure injection
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persist every record inside one transaction.
    ///
    /// Empty collections are skipped. On the first failing statement the
    /// transaction is rolled back and the error returned.
    async fn persist_batch(&self, records: &[Record]) -> Result<()>;
}

/// Initialize storage based on configuration.
///
/// Connects the configured backend and creates the event tables.
pub async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn BatchStore>> {
    let mode = ConflictMode::from_upsert(config.upsert);

    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(path = %config.sqlite.path, ?mode, "Storage: sqlite");

            if let Some(parent) = std::path::Path::new(&config.sqlite.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.sqlite.path))
                    .await?;

            let store = sql::sqlite::SqliteBatchStore::new(pool, mode);
            store.init_schema().await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            info!(pool_size = config.postgres.pool_size, ?mode, "Storage: postgres");

            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.postgres.pool_size)
                .connect(&config.postgres.uri)
                .await?;

            let store = sql::postgres::PostgresBatchStore::new(pool, mode);
            store.init_schema().await?;
            Ok(Arc::new(store))
        }
        #[allow(unreachable_patterns)]
        other => {
            error!(storage_type = %other, "Storage backend requested but its feature is not enabled");
            Err(StorageError::BackendDisabled(other))
        }
    }
}
