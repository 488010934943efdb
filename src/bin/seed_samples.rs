use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::PgPool;
use std::path::PathBuf;
use telemetry_viewer_rs::config::normalize_database_url;
use telemetry_viewer_rs::db;
use telemetry_viewer_rs::sample::Sample;
use telemetry_viewer_rs::services::seed::{self, GenerateOptions};
use telemetry_viewer_rs::services::store::SampleStore;
use telemetry_viewer_rs::services::summary;
use telemetry_viewer_rs::time::parse_timestamp;

#[derive(Parser, Debug)]
#[command(
    about = "Seed tool: replace the whole sample collection with a JSON seed file or synthetic samples (transactional)."
)]
struct Args {
    #[arg(long)]
    database_url: Option<String>,
    /// JSON array of { ts, machine_status, vibration }.
    #[arg(long, conflicts_with = "generate", required_unless_present = "generate")]
    file: Option<PathBuf>,
    /// Generate this many synthetic samples instead of reading a file.
    #[arg(long)]
    generate: Option<usize>,
    /// First synthetic timestamp (ISO-8601). Defaults to now minus the span.
    #[arg(long)]
    start: Option<String>,
    #[arg(long, default_value_t = 60)]
    step_seconds: i64,
    #[arg(long, default_value_t = 0.5)]
    active_probability: f64,
    #[arg(long)]
    rng_seed: Option<u64>,
    /// Print what would be written without touching the database.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn resolve_samples(args: &Args) -> Result<Vec<Sample>> {
    if let Some(path) = args.file.as_deref() {
        return seed::load_seed_file(path);
    }
    let count = args.generate.context("either --file or --generate is required")?;
    anyhow::ensure!(args.step_seconds > 0, "--step-seconds must be positive");
    let step = Duration::try_seconds(args.step_seconds)
        .with_context(|| format!("--step-seconds {} is out of range", args.step_seconds))?;
    let start = match args.start.as_deref() {
        Some(raw) => {
            parse_timestamp(raw).with_context(|| format!("invalid --start timestamp: {raw}"))?
        }
        None => Utc::now()
            .checked_sub_signed(seed::step_offset(step, count)?)
            .context("--generate span reaches before the representable time range")?,
    };
    let mut rng = match args.rng_seed {
        Some(value) => StdRng::seed_from_u64(value),
        None => StdRng::from_entropy(),
    };
    seed::generate_samples(
        &mut rng,
        &GenerateOptions {
            count,
            start,
            step,
            active_probability: args.active_probability,
        },
    )
}

fn resolve_database_url(args: &Args) -> Result<String> {
    args.database_url
        .clone()
        .or_else(|| std::env::var("VIEWER_DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .map(normalize_database_url)
        .context("--database-url not provided and VIEWER_DATABASE_URL / DATABASE_URL unset")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let samples = resolve_samples(&args)?;
    let summary = summary::summarize(&samples);
    println!(
        "Prepared {} samples (active={}, inactive={})",
        samples.len(),
        summary.active_count,
        summary.inactive_count
    );

    if args.dry_run {
        println!("Dry run: database untouched.");
        return Ok(());
    }

    let database_url = resolve_database_url(&args)?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("failed to connect to database")?;
    db::ensure_schema(&pool).await?;

    let store = SampleStore::postgres(pool);
    let written = seed::replace_collection(&store, &samples)
        .await
        .context("failed to replace sample collection")?;
    store.close().await;

    println!("Sample collection replaced: {written} rows written.");
    Ok(())
}
