use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub fn connect_lazy(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)
        .with_context(|| format!("Failed to create lazy database pool for {database_url}"))
}

/// Creates the `samples` table and its timestamp index when missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS samples (
            id BIGSERIAL PRIMARY KEY,
            ts TIMESTAMPTZ NOT NULL,
            machine_status BIGINT NOT NULL,
            vibration DOUBLE PRECISION NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create samples table")?;
    sqlx::query("CREATE INDEX IF NOT EXISTS samples_ts_idx ON samples (ts)")
        .execute(pool)
        .await
        .context("failed to create samples_ts_idx")?;
    Ok(())
}
