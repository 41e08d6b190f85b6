//! Analytics recording and aggregate queries.
//!
//! Writes go through a bounded queue drained by one background worker, so a
//! stalled database holds at most one blocking thread and generation never
//! waits on it. A full queue drops the record with a warning.
//!
//! Reads run on the blocking pool under a per-operation timeout, with at most
//! `MAX_CONCURRENT_READS` in flight.

use std::sync::Arc;
use std::time::Duration;

use analytics_db::{Database, DbError, FeatureStats, NewRequest, Timeframe};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{self, JoinError};

/// Maximum number of records waiting to be written.
const QUEUE_CAPACITY: usize = 1024;

/// Blocking threads that analytics reads may occupy at once.
const MAX_CONCURRENT_READS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Analytics operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Analytics worker failed: {0}")]
    Worker(#[from] JoinError),

    #[error("Analytics service is shutting down")]
    Closed,
}

/// Request count over one reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    pub timeframe: Timeframe,
    pub count: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

#[derive(Clone)]
pub struct AnalyticsService {
    db: Database,
    timeout: Duration,
    writer: mpsc::Sender<NewRequest>,
    reads: Arc<Semaphore>,
}

impl AnalyticsService {
    /// Create the service and start its background writer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(db: Database, timeout: Duration) -> Self {
        Self::with_capacity(db, timeout, QUEUE_CAPACITY)
    }

    fn with_capacity(db: Database, timeout: Duration, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<NewRequest>(capacity);
        tokio::spawn(writer_loop(db.clone(), rx));
        tracing::info!("Analytics writer started (capacity={capacity})");

        Self {
            db,
            timeout,
            writer: tx,
            reads: Arc::new(Semaphore::new(MAX_CONCURRENT_READS)),
        }
    }

    async fn read<F, R>(&self, op: &'static str, f: F) -> Result<R, AnalyticsError>
    where
        F: FnOnce(&Database) -> Result<R, DbError> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.db.clone();
        let reads = Arc::clone(&self.reads);
        let work = async move {
            let permit = reads
                .acquire_owned()
                .await
                .map_err(|_| AnalyticsError::Closed)?;
            let result = task::spawn_blocking(move || {
                // Held until the query returns, even if the caller gave up.
                let _permit = permit;
                f(&db)
            })
            .await?;
            Ok::<R, AnalyticsError>(result?)
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    op,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Analytics operation timed out"
                );
                Err(AnalyticsError::Timeout(self.timeout))
            }
        }
    }

    /// Queue a record for the background writer. Returns whether it was
    /// accepted; when the queue is full the record is dropped.
    pub fn record_detached(&self, req: NewRequest) -> bool {
        match self.writer.try_send(req) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Analytics queue full, dropping record");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Analytics writer stopped, dropping record");
                false
            }
        }
    }

    pub async fn total(&self) -> Result<i64, AnalyticsError> {
        self.read("total", |db| db.count_requests()).await
    }

    pub async fn period(&self, timeframe: Timeframe) -> Result<PeriodCount, AnalyticsError> {
        let now = Utc::now();
        let count = self
            .read("period", move |db| db.count_requests_in(timeframe, now))
            .await?;
        let (period_start, period_end) = timeframe.span(now);
        Ok(PeriodCount {
            timeframe,
            count,
            period_start,
            period_end,
        })
    }

    pub async fn features(&self) -> Result<FeatureStats, AnalyticsError> {
        self.read("features", |db| db.feature_stats()).await
    }
}

/// Background writer: one insert at a time, failures logged and dropped.
async fn writer_loop(db: Database, mut rx: mpsc::Receiver<NewRequest>) {
    while let Some(req) = rx.recv().await {
        let db = db.clone();
        match task::spawn_blocking(move || db.record_request(&req)).await {
            Ok(Ok(id)) => tracing::debug!(id, "Recorded QR analytics"),
            Ok(Err(e)) => tracing::error!("Failed to record QR analytics: {e}"),
            Err(e) => tracing::error!("Analytics writer task failed: {e}"),
        }
    }
    tracing::info!("Analytics writer stopped");
}
