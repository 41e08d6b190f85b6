use std::sync::Arc;

use analytics_db::Database;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::services::analytics::AnalyticsService;
use crate::services::logo::LogoFetcher;
use crate::services::pipeline::QrPipeline;

/// Application shared state accessible from axum handlers.
///
/// Everything inside is read-only after construction; requests share no
/// mutable state besides the database handle.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    config: AppConfig,
    db: Database,
    pipeline: QrPipeline,
    analytics: AnalyticsService,
    shutdown_token: CancellationToken,
}

impl SharedState {
    /// Create shared state from an already-opened database and loaded config.
    ///
    /// Starts the analytics writer, so it must run inside a tokio runtime.
    pub fn new(db: Database, config: AppConfig) -> Result<Self, anyhow::Error> {
        let logo = LogoFetcher::new(config.logo_fetch_timeout, config.logo_max_bytes)?;
        let analytics = AnalyticsService::start(db.clone(), config.analytics_timeout);

        Ok(Self {
            inner: Arc::new(SharedStateInner {
                pipeline: QrPipeline::new(logo, config.max_box_size),
                analytics,
                db,
                config,
                shutdown_token: CancellationToken::new(),
            }),
        })
    }

    pub fn server_port(&self) -> u16 {
        self.inner.config.server_port
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn pipeline(&self) -> &QrPipeline {
        &self.inner.pipeline
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.inner.analytics
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }
}
