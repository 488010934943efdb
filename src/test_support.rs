use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::ViewerConfig;
use crate::db;
use crate::sample::Sample;
use crate::services::store::SampleStore;
use crate::state::AppState;

// Nothing listens on port 1, so every acquire fails fast.
const UNREACHABLE_DATABASE_URL: &str = "postgresql://postgres@127.0.0.1:1/telemetry";

pub fn ts(raw: &str) -> DateTime<Utc> {
    crate::time::parse_timestamp(raw).expect("timestamp")
}

/// Three hourly samples: active, inactive, active.
pub fn fixture_samples() -> Vec<Sample> {
    vec![
        Sample::new(ts("2024-01-01T00:00:00Z"), 1, 0.5),
        Sample::new(ts("2024-01-01T01:00:00Z"), 0, 0.1),
        Sample::new(ts("2024-01-01T02:00:00Z"), 1, 0.7),
    ]
}

pub fn test_config() -> ViewerConfig {
    ViewerConfig {
        database_url: None,
        demo_mode: true,
        demo_seed_path: None,
        static_root: None,
        cors_allowed_origins: Vec::new(),
        db_max_connections: 1,
        db_acquire_timeout: Duration::from_secs(1),
    }
}

pub fn test_state(samples: Vec<Sample>) -> AppState {
    AppState {
        config: test_config(),
        store: SampleStore::memory(samples),
    }
}

pub fn unavailable_store() -> SampleStore {
    let pool = db::connect_lazy(UNREACHABLE_DATABASE_URL, 1, Duration::from_secs(1))
        .expect("connect_lazy");
    SampleStore::postgres(pool)
}

pub fn unavailable_state() -> AppState {
    let mut config = test_config();
    config.demo_mode = false;
    config.database_url = Some(UNREACHABLE_DATABASE_URL.to_string());
    AppState {
        config,
        store: unavailable_store(),
    }
}
