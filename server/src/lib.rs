pub mod app;
pub mod config;
pub mod server;
pub mod services;

use analytics_db::Database;

use config::AppConfig;

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load config, prepare the data directory and open the analytics database.
pub fn init_foundation() -> Result<(Database, AppConfig), anyhow::Error> {
    load_dotenv();
    let config = AppConfig::from_env();

    std::fs::create_dir_all(&config.data_dir)?;
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!("Opening database at {}", config.db_path.display());
    let db = Database::open(&config.db_path)?;

    tracing::info!(
        port = config.server_port,
        logo_timeout_secs = config.logo_fetch_timeout.as_secs(),
        logo_max_bytes = config.logo_max_bytes,
        analytics_timeout_ms = config.analytics_timeout.as_millis() as u64,
        max_box_size = config.max_box_size,
        "Settings loaded"
    );
    Ok((db, config))
}
