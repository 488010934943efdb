use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ViewerConfig;
use crate::db;
use crate::sample::Sample;
use crate::services::seed;
use crate::time::TimeRange;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sample store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("sample store rejected seed data: {0}")]
    Rejected(String),
}

#[derive(sqlx::FromRow)]
struct SampleRow {
    ts: DateTime<Utc>,
    machine_status: i64,
    vibration: f64,
}

impl From<SampleRow> for Sample {
    fn from(row: SampleRow) -> Self {
        Sample::new(row.ts, row.machine_status, row.vibration)
    }
}

/// Process-wide handle to wherever samples live. Cloning shares the
/// underlying pool or vector.
#[derive(Clone)]
pub enum SampleStore {
    Postgres(PgPool),
    Memory(MemoryStore),
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    samples: Arc<RwLock<Vec<Sample>>>,
}

impl SampleStore {
    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(pool)
    }

    pub fn memory(samples: Vec<Sample>) -> Self {
        Self::Memory(MemoryStore {
            samples: Arc::new(RwLock::new(samples)),
        })
    }

    /// Builds the store selected by `config`. Runs once before serving.
    pub async fn open(config: &ViewerConfig) -> anyhow::Result<Self> {
        if config.demo_mode {
            let samples = match config.demo_seed_path.as_deref() {
                Some(path) => seed::load_seed_file(path)?,
                None => Vec::new(),
            };
            tracing::info!(count = samples.len(), "demo mode: serving samples from memory");
            return Ok(Self::memory(samples));
        }

        let database_url = config
            .database_url
            .as_deref()
            .context("database_url is required outside demo mode")?;
        let pool = db::connect_lazy(
            database_url,
            config.db_max_connections,
            config.db_acquire_timeout,
        )?;
        if let Err(err) = db::ensure_schema(&pool).await {
            tracing::warn!("failed to ensure samples schema: {err:#}");
        }
        Ok(Self::postgres(pool))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Samples inside `range` (inclusive), or every sample when `range` is
    /// `None`. Results keep insertion order.
    pub async fn fetch(&self, range: Option<&TimeRange>) -> Result<Vec<Sample>, StoreError> {
        match self {
            Self::Postgres(pool) => {
                let rows: Vec<SampleRow> = match range {
                    Some(range) => {
                        sqlx::query_as(
                            r#"
                            SELECT ts, machine_status, vibration
                            FROM samples
                            WHERE ts >= $1
                              AND ts <= $2
                            ORDER BY id
                            "#,
                        )
                        .bind(range.start)
                        .bind(range.end)
                        .fetch_all(pool)
                        .await?
                    }
                    None => {
                        sqlx::query_as(
                            r#"
                            SELECT ts, machine_status, vibration
                            FROM samples
                            ORDER BY id
                            "#,
                        )
                        .fetch_all(pool)
                        .await?
                    }
                };
                Ok(rows.into_iter().map(Sample::from).collect())
            }
            Self::Memory(memory) => {
                let samples = memory.samples.read().await;
                Ok(samples
                    .iter()
                    .filter(|sample| range.map_or(true, |range| range.contains(sample.timestamp)))
                    .cloned()
                    .collect())
            }
        }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Sample>, StoreError> {
        self.fetch(None).await
    }

    /// Replaces the whole collection with `samples`. Readers observe either
    /// the old or the new contents, never a mix.
    pub async fn replace_all(&self, samples: &[Sample]) -> Result<u64, StoreError> {
        match self {
            Self::Postgres(pool) => {
                let timestamps: Vec<DateTime<Utc>> = samples.iter().map(|s| s.timestamp).collect();
                let statuses: Vec<i64> = samples.iter().map(|s| s.status).collect();
                let vibrations: Vec<f64> = samples.iter().map(|s| s.vibration).collect();

                let mut tx = pool.begin().await?;
                sqlx::query("DELETE FROM samples")
                    .execute(&mut *tx)
                    .await?;
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO samples (ts, machine_status, vibration)
                    SELECT * FROM UNNEST($1::timestamptz[], $2::bigint[], $3::float8[])
                    "#,
                )
                .bind(&timestamps)
                .bind(&statuses)
                .bind(&vibrations)
                .execute(&mut *tx)
                .await
                .map_err(classify_write_error)?;
                tx.commit().await?;
                Ok(inserted.rows_affected())
            }
            Self::Memory(memory) => {
                let mut stored = memory.samples.write().await;
                *stored = samples.to_vec();
                Ok(stored.len() as u64)
            }
        }
    }

    /// Releases pooled connections. Called once on shutdown.
    pub async fn close(&self) {
        if let Self::Postgres(pool) = self {
            pool.close().await;
        }
    }
}

fn classify_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
        _ => StoreError::Unavailable(err),
    }
}
