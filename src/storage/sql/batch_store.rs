//! Unified SQL BatchStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;
use crate::storage::ConflictMode;

/// SQL-based implementation of BatchStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlBatchStore<DB: SqlDatabase> {
    pool: DB::Pool,
    mode: ConflictMode,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlBatchStore<DB> {
    /// Create a new SQL batch store with the given pool.
    pub fn new(pool: DB::Pool, mode: ConflictMode) -> Self {
        Self {
            pool,
            mode,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }

    pub fn mode(&self) -> ConflictMode {
        self.mode
    }
}

/// Macro to implement BatchStore for a specific SQL backend.
macro_rules! impl_batch_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlBatchStore<$db_type> {
            /// Create every event table if missing.
            pub async fn init_schema(&self) -> crate::storage::Result<()> {
                use crate::storage::schema::{create_table, EventTable};

                for table in EventTable::ALL {
                    let sql = <$db_type>::build_schema(create_table(table));
                    sqlx::query(&sql).execute(&self.pool).await?;
                }

                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::BatchStore for SqlBatchStore<$db_type> {
            async fn persist_batch(
                &self,
                records: &[crate::model::Record],
            ) -> crate::storage::Result<()> {
                use tracing::{debug, warn};

                use crate::storage::StorageError;

                let mut statements = Vec::with_capacity(records.len());
                for (index, record) in records.iter().enumerate() {
                    if let Some(stmt) = super::build_insert(record, self.mode)? {
                        statements.push((index, <$db_type>::build_insert(stmt)));
                    }
                }

                if statements.is_empty() {
                    return Ok(());
                }

                let mut tx = self.pool.begin().await?;

                for (index, sql) in &statements {
                    if let Err(source) = sqlx::query(sql).execute(&mut *tx).await {
                        if let Err(e) = tx.rollback().await {
                            warn!(error = %e, "Rollback failed");
                        }
                        return Err(StorageError::Statement {
                            index: *index,
                            source,
                        });
                    }
                }

                tx.commit().await?;

                debug!(
                    records = records.len(),
                    statements = statements.len(),
                    "Persisted batch"
                );

                Ok(())
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_batch_store!(super::postgres::Postgres, "postgres");
impl_batch_store!(super::sqlite::Sqlite, "sqlite");
