//! PostgreSQL snapshot store backed by a `sqlx` connection pool.

use super::{SnapshotStore, SnapshotTransaction, StoreError};
use crate::domain::{is_valid_identifier, ClearMode, ColumnSpec, SqlValue};
use crate::infra::config::DatabaseConfig;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

#[derive(Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the bounded pool described by `config` and checks one connection out
    /// so a bad URL fails at startup rather than on the first sync.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Column names of `table` in the current schema, in ordinal order.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT column_name
             FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            columns.push(row.try_get::<String, _>("column_name")?);
        }
        Ok(columns)
    }

    pub async fn row_count(&self, table: &str) -> Result<i64, StoreError> {
        ensure_identifier(table)?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*)::bigint FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn begin(&self) -> Result<Box<dyn SnapshotTransaction>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // Zone-less date/time text is read as UTC, whatever the server default.
        sqlx::query("SELECT set_config('TimeZone', 'UTC', true)")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgSnapshotTransaction { tx }))
    }
}

pub struct PgSnapshotTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SnapshotTransaction for PgSnapshotTransaction {
    async fn lock_table(&mut self, table: &str) -> Result<(), StoreError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(table)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn clear(&mut self, table: &str, mode: ClearMode) -> Result<u64, StoreError> {
        ensure_identifier(table)?;
        let sql = match mode {
            ClearMode::DeleteAll => format!("DELETE FROM {}", table),
            ClearMode::TruncateReset => format!("TRUNCATE TABLE {} RESTART IDENTITY", table),
        };
        let result = sqlx::query(&sql).execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[ColumnSpec],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        ensure_identifier(table)?;
        let mut qb = build_insert(table, columns, rows);
        let result = qb.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn ensure_identifier(table: &str) -> Result<(), StoreError> {
    if is_valid_identifier(table) {
        Ok(())
    } else {
        Err(StoreError::Backend(format!("invalid table name '{}'", table)))
    }
}

/// Builds `INSERT INTO table (c1, c2, ..) VALUES ($1, $2, ..), (..)` with one
/// bind parameter per (row, column). Date/time values are cast to
/// `timestamptz`; Postgres narrows that on assignment to `date` or
/// `timestamp`, so timestamp columns keep the time of day.
///
/// `table` and the column names must already be valid identifiers and `rows`
/// must be non-empty.
pub fn build_insert<'a>(
    table: &str,
    columns: &[ColumnSpec],
    rows: &'a [Vec<SqlValue>],
) -> QueryBuilder<'a, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO ");
    qb.push(table).push(" (");
    {
        let mut names = qb.separated(", ");
        for c in columns {
            names.push(&c.name);
        }
    }
    qb.push(") ");

    qb.push_values(rows, |mut b, row| {
        for value in row {
            match value {
                SqlValue::Text(v) => {
                    b.push_bind(v.clone());
                }
                SqlValue::Integer(v) => {
                    b.push_bind(*v);
                }
                SqlValue::Float(v) => {
                    b.push_bind(*v);
                }
                SqlValue::Date(v) => {
                    b.push_bind(v.clone()).push_unseparated("::timestamptz");
                }
            }
        }
    });
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CoercionClass;

    #[test]
    fn insert_has_one_placeholder_per_value() {
        let columns = vec![
            ColumnSpec::new("code", CoercionClass::StringTrimmed),
            ColumnSpec::new("clients", CoercionClass::IntegerOrNull),
        ];
        let rows = vec![
            vec![SqlValue::Text(Some("1".into())), SqlValue::Integer(Some(4))],
            vec![SqlValue::Text(None), SqlValue::Integer(None)],
            vec![SqlValue::Text(Some("3".into())), SqlValue::Integer(Some(0))],
        ];

        let qb = build_insert("clients", &columns, &rows);
        assert_eq!(
            qb.sql(),
            "INSERT INTO clients (code, clients) VALUES ($1, $2), ($3, $4), ($5, $6)"
        );
    }

    #[test]
    fn date_placeholders_are_cast() {
        let columns = vec![
            ColumnSpec::new("code", CoercionClass::StringTrimmed),
            ColumnSpec::new("installationdate", CoercionClass::DatePassthrough),
        ];
        let rows = vec![vec![
            SqlValue::Text(Some("1".into())),
            SqlValue::Date(Some("2024-01-31".into())),
        ]];

        let qb = build_insert("clients", &columns, &rows);
        assert_eq!(
            qb.sql(),
            "INSERT INTO clients (code, installationdate) VALUES ($1, $2::timestamptz)"
        );
    }

    #[test]
    fn identifier_guard() {
        assert!(ensure_identifier("clients_2024").is_ok());
        assert!(matches!(
            ensure_identifier("clients; DROP TABLE x"),
            Err(StoreError::Backend(_))
        ));
    }
}
