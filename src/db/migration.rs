use crate::db::INIT_SCHEMA;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!(service = "db", "Running database migrations...");

    // Every statement is CREATE ... IF NOT EXISTS, so this is safe on each start
    sqlx::raw_sql(INIT_SCHEMA).execute(pool).await?;

    info!(service = "db", "Database migrations completed successfully");
    Ok(())
}
