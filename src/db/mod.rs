//! Generic statement executor shared by every repository.
//!
//! Statements are written with `?` placeholders and bound positionally from
//! [`SqlParam`]s. Identifiers (table and column names, assignment fragments)
//! are always crate constants, never caller input.

mod params;
mod transaction;

pub use params::SqlParam;
pub use transaction::*;

use std::future::Future;
use std::time::Duration;

use chrono::{
    DateTime,
    offset::Utc,
};
use sqlx::{postgres::PgRow, FromRow, PgExecutor, PgPool, Postgres, Transaction};

use crate::error::DbError;

pub type Timestamp = DateTime<Utc>;

#[derive(Clone)]
pub struct SqlExecutor {
    pool: PgPool,
    round_trip_timeout: Option<Duration>,
}

impl SqlExecutor {
    pub fn new(pool: PgPool) -> SqlExecutor {
        SqlExecutor { pool, round_trip_timeout: None }
    }

    /// Bounds every round trip issued through this executor.
    pub fn with_round_trip_timeout(mut self, timeout: Duration) -> SqlExecutor {
        self.round_trip_timeout = Some(timeout);
        self
    }

    pub fn round_trip_timeout(&self) -> Option<Duration> {
        self.round_trip_timeout
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DbError> {
        bounded(self.round_trip_timeout, async {
            self.pool.begin().await.map_err(DbError::from)
        }).await
    }

    /// Inserts one row and returns the identity assigned to `id_column`.
    ///
    /// # Panics
    ///
    /// When `fields` and `params` differ in length.
    pub async fn create<I>(&self, table: &str, id_column: &str, fields: &[&str], params: Vec<SqlParam>)
    -> Result<I, DbError>
    where
        I: Send + Unpin,
        (I,): for<'r> FromRow<'r, PgRow>,
    {
        if fields.is_empty() {
            return Err(DbError::InvalidArgument(format!("no fields given for insert into {}", table)));
        }
        assert_eq!(fields.len(), params.len(), "insert into {} has mismatched fields and params", table);

        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            fields.join(", "),
            placeholders,
            id_column
        );
        let (sql, args) = params::prepare(&sql, params)?;

        bounded(self.round_trip_timeout, async {
            sqlx::query_scalar_with::<_, I, _>(&sql, args)
                .fetch_one(&self.pool)
                .await
                .map_err(DbError::from)
        }).await
    }

    /// Applies `assignments` (e.g. `"question = ?"`, `"expires_at = NULL"`)
    /// to the row keyed by `id`.
    ///
    /// Returns whether the backend reported an affected row, so `false`
    /// means either nothing to change or no such row. An empty assignment
    /// list issues no statement at all.
    pub async fn update(&self,
        table: &str,
        id_column: &str,
        id: impl Into<SqlParam>,
        assignments: &[&str],
        mut params: Vec<SqlParam>,
    ) -> Result<bool, DbError> {
        let id = id.into();
        id.validate_key()?;
        if assignments.is_empty() {
            return Ok(false);
        }

        let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, assignments.join(", "), id_column);
        params.push(id);
        self.execute(&sql, params).await.map(|affected| affected > 0)
    }

    /// Deletes the row keyed by `id`, provided every one of
    /// `extra_conditions` also holds for it.
    pub async fn delete(&self,
        table: &str,
        id_column: &str,
        id: impl Into<SqlParam>,
        extra_conditions: &[&str],
    ) -> Result<bool, DbError> {
        let id = id.into();
        id.validate_key()?;

        let mut sql = format!("DELETE FROM {} WHERE {} = ?", table, id_column);
        for condition in extra_conditions {
            sql.push_str(" AND ");
            sql.push_str(condition);
        }
        self.execute(&sql, vec!(id)).await.map(|affected| affected > 0)
    }

    /// `None` when nothing matches; interpreting that is up to the caller.
    pub async fn read_one<T>(&self, sql: &str, params: Vec<SqlParam>) -> Result<Option<T>, DbError>
    where T: for<'r> FromRow<'r, PgRow> + Send + Unpin {
        bounded(self.round_trip_timeout, fetch_optional(&self.pool, sql, params)).await
    }

    pub async fn read_all<T>(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<T>, DbError>
    where T: for<'r> FromRow<'r, PgRow> + Send + Unpin {
        bounded(self.round_trip_timeout, fetch_all(&self.pool, sql, params)).await
    }

    /// Runs a statement and returns the affected row count.
    pub async fn execute(&self, sql: &str, params: Vec<SqlParam>) -> Result<u64, DbError> {
        bounded(self.round_trip_timeout, execute(&self.pool, sql, params)).await
    }
}

pub(crate) async fn fetch_optional<'e, E, T>(executor: E, sql: &str, params: Vec<SqlParam>)
-> Result<Option<T>, DbError>
where
    E: PgExecutor<'e>,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let (sql, args) = params::prepare(sql, params)?;
    debug!("fetch_optional: {}", sql);
    let row = sqlx::query_as_with::<_, T, _>(&sql, args)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub(crate) async fn fetch_all<'e, E, T>(executor: E, sql: &str, params: Vec<SqlParam>)
-> Result<Vec<T>, DbError>
where
    E: PgExecutor<'e>,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let (sql, args) = params::prepare(sql, params)?;
    debug!("fetch_all: {}", sql);
    let rows = sqlx::query_as_with::<_, T, _>(&sql, args)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub(crate) async fn execute<'e, E>(executor: E, sql: &str, params: Vec<SqlParam>) -> Result<u64, DbError>
where E: PgExecutor<'e> {
    let (sql, args) = params::prepare(sql, params)?;
    debug!("execute: {}", sql);
    let done = sqlx::query_with(&sql, args)
        .execute(executor)
        .await?;
    Ok(done.rows_affected())
}

pub(crate) async fn bounded<T, F>(timeout: Option<Duration>, round_trip: F) -> Result<T, DbError>
where F: Future<Output = Result<T, DbError>> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, round_trip)
            .await
            .map_err(|_| DbError::DeadlineExceeded(limit))?,
        None => round_trip.await,
    }
}
