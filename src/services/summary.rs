use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Active vs inactive counts over one result set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub active_count: u64,
    pub inactive_count: u64,
}

impl Summary {
    pub fn total(&self) -> u64 {
        self.active_count + self.inactive_count
    }
}

pub fn summarize(samples: &[Sample]) -> Summary {
    let active_count = samples.iter().filter(|sample| sample.is_active()).count() as u64;
    Summary {
        active_count,
        inactive_count: samples.len() as u64 - active_count,
    }
}

/// Maximal run of consecutive samples (in timestamp order) sharing one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stretch {
    #[serde(rename = "machine_status")]
    pub status: i64,
    #[serde(with = "crate::time::iso8601")]
    #[schema(value_type = String)]
    pub start: DateTime<Utc>,
    #[serde(with = "crate::time::iso8601")]
    #[schema(value_type = String)]
    pub end: DateTime<Utc>,
    pub samples: u64,
    pub duration_seconds: i64,
}

pub fn stretches(samples: &[Sample]) -> Vec<Stretch> {
    let mut ordered: Vec<&Sample> = samples.iter().collect();
    // Stable: equal timestamps keep insertion order.
    ordered.sort_by_key(|sample| sample.timestamp);

    let mut runs: Vec<Stretch> = Vec::new();
    for sample in ordered {
        match runs.last_mut() {
            Some(run) if run.status == sample.status => {
                run.end = sample.timestamp;
                run.samples += 1;
            }
            _ => runs.push(Stretch {
                status: sample.status,
                start: sample.timestamp,
                end: sample.timestamp,
                samples: 1,
                duration_seconds: 0,
            }),
        }
    }
    for run in &mut runs {
        run.duration_seconds = (run.end - run.start).num_seconds();
    }
    runs
}
