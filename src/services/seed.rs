use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::path::Path;

use crate::sample::Sample;
use crate::services::store::{SampleStore, StoreError};

/// Reads a seed file: a JSON array of `{ ts, machine_status, vibration }`.
pub fn load_seed_file(path: &Path) -> Result<Vec<Sample>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    parse_seed_json(&raw).with_context(|| format!("failed to parse seed file {}", path.display()))
}

pub fn parse_seed_json(raw: &str) -> Result<Vec<Sample>> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(raw).context("seed data must be a JSON array")?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value::<Sample>(record)
                .with_context(|| format!("invalid sample record at index {index}"))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub count: usize,
    pub start: DateTime<Utc>,
    pub step: Duration,
    pub active_probability: f64,
}

/// `step * index`, failing instead of overflowing chrono's range.
pub fn step_offset(step: Duration, index: usize) -> Result<Duration> {
    let millis = i64::try_from(index)
        .ok()
        .and_then(|index| step.num_milliseconds().checked_mul(index))
        .with_context(|| format!("offset of {index} steps of {step} overflows"))?;
    Duration::try_milliseconds(millis)
        .with_context(|| format!("offset of {index} steps of {step} overflows"))
}

/// Synthetic demo samples: random binary status with a vibration reading
/// that is higher while the machine is active.
pub fn generate_samples<R: Rng>(rng: &mut R, options: &GenerateOptions) -> Result<Vec<Sample>> {
    let probability = options.active_probability.clamp(0.0, 1.0);
    (0..options.count)
        .map(|index| {
            let timestamp = options
                .start
                .checked_add_signed(step_offset(options.step, index)?)
                .with_context(|| {
                    format!("sample {index} falls outside the representable time range")
                })?;
            let active = rng.gen_bool(probability);
            let vibration = if active {
                rng.gen_range(2.0..8.0)
            } else {
                rng.gen_range(0.0..0.5)
            };
            let vibration = (vibration * 1000.0_f64).round() / 1000.0;
            Ok(Sample::new(timestamp, i64::from(active), vibration))
        })
        .collect()
}

pub async fn replace_collection(store: &SampleStore, samples: &[Sample]) -> Result<u64, StoreError> {
    tracing::info!(
        backend = store.backend_name(),
        count = samples.len(),
        "replacing sample collection"
    );
    let written = store.replace_all(samples).await?;
    tracing::info!(written, "sample collection replaced");
    Ok(written)
}
