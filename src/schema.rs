use crate::db::SqlExecutor;
use crate::error::DbError;

/// Brings the database up to the latest migration in `migrations/`.
/// Migrations that already ran are skipped.
pub async fn create_tables(db: &SqlExecutor) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(db.pool())
        .await
        .map_err(|e| DbError::from(sqlx::Error::Migrate(Box::new(e))))?;
    info!("database schema is up to date");
    Ok(())
}
