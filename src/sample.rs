use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status value counted as "active" by the summary.
pub const ACTIVE_STATUS: i64 = 1;

/// One stored observation. Wire and column names follow the collection layout
/// the dashboard already reads (`ts`, `machine_status`, `vibration`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Sample {
    #[serde(rename = "ts", with = "crate::time::iso8601")]
    #[schema(value_type = String, example = "2024-01-01T00:00:00Z")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "machine_status")]
    pub status: i64,
    pub vibration: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, status: i64, vibration: f64) -> Self {
        Self {
            timestamp,
            status,
            vibration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}
