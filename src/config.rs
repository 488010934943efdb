use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECONDS: u64 = 8;

/// Optional JSON file (`VIEWER_CONFIG_PATH`) with deployment defaults.
/// Environment variables take precedence over anything in it.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFileOverrides {
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    demo_mode: Option<bool>,
    #[serde(default)]
    demo_seed_path: Option<String>,
}

fn load_config_file_overrides(path: Option<PathBuf>) -> Option<ConfigFileOverrides> {
    let path = path?;
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read config file; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse config file; using env defaults"
            );
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub database_url: Option<String>,
    pub demo_mode: bool,
    pub demo_seed_path: Option<PathBuf>,
    pub static_root: Option<PathBuf>,
    pub cors_allowed_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl ViewerConfig {
    pub fn from_env(cli_static_root: Option<PathBuf>) -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let env = Env { lookup: &lookup };
        let overrides = load_config_file_overrides(env.optional_path("VIEWER_CONFIG_PATH"));
        Self::resolve(&env, overrides.unwrap_or_default(), cli_static_root)
    }

    fn resolve(
        env: &Env<'_>,
        overrides: ConfigFileOverrides,
        cli_static_root: Option<PathBuf>,
    ) -> Result<Self> {
        let demo_mode = env
            .optional_bool("VIEWER_DEMO_MODE")
            .or(overrides.demo_mode)
            .unwrap_or(false);

        let database_url = env
            .optional_string("VIEWER_DATABASE_URL")
            .or_else(|| env.optional_string("DATABASE_URL"))
            .or_else(|| non_blank(overrides.database_url))
            .map(normalize_database_url);
        if !demo_mode {
            database_url.as_ref().context(
                "VIEWER_DATABASE_URL (or DATABASE_URL) must be set unless VIEWER_DEMO_MODE is enabled",
            )?;
        }

        let demo_seed_path = env
            .optional_path("VIEWER_DEMO_SEED_PATH")
            .or_else(|| non_blank(overrides.demo_seed_path).map(PathBuf::from));
        let static_root = cli_static_root.or_else(|| env.optional_path("VIEWER_STATIC_ROOT"));
        let cors_allowed_origins = env
            .optional_string("VIEWER_CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let db_max_connections = env
            .u32("VIEWER_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)
            .clamp(1, 100);
        let db_acquire_timeout = Duration::from_secs(
            env.u64(
                "VIEWER_DB_ACQUIRE_TIMEOUT_SECONDS",
                DEFAULT_DB_ACQUIRE_TIMEOUT_SECONDS,
            )
            .clamp(1, 300),
        );

        Ok(Self {
            database_url,
            demo_mode,
            demo_seed_path,
            static_root,
            cors_allowed_origins,
            db_max_connections,
            db_acquire_timeout,
        })
    }
}

struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    fn optional_string(&self, key: &str) -> Option<String> {
        non_blank((self.lookup)(key))
    }

    fn optional_path(&self, key: &str) -> Option<PathBuf> {
        self.optional_string(key).map(PathBuf::from)
    }

    fn optional_bool(&self, key: &str) -> Option<bool> {
        match self.optional_string(key)?.to_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    }

    fn u32(&self, key: &str, default: u32) -> u32 {
        self.optional_string(key)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(default)
    }

    fn u64(&self, key: &str, default: u64) -> u64 {
        self.optional_string(key)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(default)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    if let Some(stripped) = url.strip_prefix("postgresql+asyncpg://") {
        return format!("postgresql://{stripped}");
    }
    url
}
