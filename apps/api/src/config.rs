use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";
const DEFAULT_SIMILAR_POSTS_K: usize = 3;

/// Startup configuration failures. Any of these halts the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(String),

    #[error("Environment variable '{key}' is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub azure_openai_api_key: String,
    pub azure_openai_endpoint: String,
    pub azure_openai_deployment: String,
    pub azure_openai_api_version: String,
    /// Unset means the similarity index is treated as empty.
    pub similarity_search_url: Option<String>,
    pub similar_posts_k: usize,
    pub hooks_path: PathBuf,
    pub frameworks_path: PathBuf,
    pub ctas_path: PathBuf,
    /// Unset disables eviction of idle client memory.
    pub client_idle_ttl: Option<Duration>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            azure_openai_api_key: require_env("AZURE_OPENAI_API_KEY")?,
            azure_openai_endpoint: require_env("AZURE_OPENAI_ENDPOINT")?,
            azure_openai_deployment: require_env("AZURE_OPENAI_DEPLOYMENT_NAME")?,
            azure_openai_api_version: optional_env("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            similarity_search_url: optional_env("SIMILARITY_SEARCH_URL"),
            similar_posts_k: parse_env("SIMILAR_POSTS_K")?.unwrap_or(DEFAULT_SIMILAR_POSTS_K),
            hooks_path: path_env("HOOKS_PATH", "data/hooks.txt"),
            frameworks_path: path_env("FRAMEWORKS_PATH", "data/frameworks.txt"),
            ctas_path: path_env("CTAS_PATH", "data/ctas.txt"),
            client_idle_ttl: parse_env::<u64>("CLIENT_IDLE_TTL_SECS")?.map(Duration::from_secs),
            port: parse_env("PORT")?.unwrap_or(8080),
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    optional_env(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// Returns the variable's value, treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn path_env(key: &str, default: &str) -> PathBuf {
    PathBuf::from(optional_env(key).unwrap_or_else(|| default.to_string()))
}

fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
