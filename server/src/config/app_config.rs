//! Runtime application configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use super::validation::validate_setting;

/// Runtime configuration with defaults for every value.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logo_fetch_timeout: Duration,
    pub logo_max_bytes: usize,
    pub analytics_timeout: Duration,
    pub max_box_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            server_port: 8000,
            db_path: data_dir.join("analytics.db"),
            data_dir,
            logo_fetch_timeout: Duration::from_secs(5),
            logo_max_bytes: 5 * 1024 * 1024,
            analytics_timeout: Duration::from_millis(2000),
            max_box_size: 25,
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Missing keys keep their defaults; invalid values are logged and
    /// ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let g = |key: &str| -> Option<String> {
            let value = lookup(key)?;
            match validate_setting(key, &value) {
                Ok(()) => Some(value),
                Err(e) => {
                    tracing::warn!(key, value = %value, "Ignoring invalid setting: {e}");
                    None
                }
            }
        };

        let defaults = Self::default();
        let data_dir = g("QR_SERVICE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let db_path = g("QR_SERVICE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("analytics.db"));

        Self {
            server_port: parse_or(g("SERVER_PORT"), defaults.server_port),
            logo_fetch_timeout: g("LOGO_FETCH_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.logo_fetch_timeout),
            logo_max_bytes: parse_or(g("LOGO_MAX_BYTES"), defaults.logo_max_bytes),
            analytics_timeout: g("ANALYTICS_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.analytics_timeout),
            max_box_size: parse_or(g("MAX_BOX_SIZE"), defaults.max_box_size),
            data_dir,
            db_path,
        }
    }
}

/// Priority: QR_SERVICE_DATA_DIR (handled by the caller) > ~/.qr-service
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".qr-service")
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
