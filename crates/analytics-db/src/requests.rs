//! Append-only log of generated QR codes and the aggregates read from it.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::period::{TIMESTAMP_FORMAT, Timeframe};
use crate::queries::NamedQuery;
use crate::{Database, DbError};

/// Metadata of one successful generation. `created_at` is assigned by the
/// database on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub has_color: bool,
    pub has_logo: bool,
    pub size: i64,
    pub response_time_ms: i64,
}

/// Feature usage breakdown across every recorded request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub total: i64,
    pub with_color: i64,
    pub with_logo: i64,
    pub with_both: i64,
    pub average_size: Option<f64>,
    pub average_response_time_ms: Option<f64>,
}

impl NewRequest {
    fn validate(&self) -> Result<(), DbError> {
        if self.size < 1 {
            return Err(DbError::InvalidData(format!("size must be positive, got {}", self.size)));
        }
        if self.response_time_ms < 0 {
            return Err(DbError::InvalidData(format!(
                "response_time_ms must not be negative, got {}",
                self.response_time_ms
            )));
        }
        Ok(())
    }
}

impl Database {
    /// Append a request row stamped with the current time. Returns the row id.
    pub fn record_request(&self, req: &NewRequest) -> Result<i64, DbError> {
        req.validate()?;
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.prepare_cached(NamedQuery::Insert.sql())?.execute(params![
                req.has_color,
                req.has_logo,
                req.size,
                req.response_time_ms
            ])?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    /// Append a request row with an explicit creation time, for seeding
    /// reporting windows in tests.
    #[cfg(test)]
    pub(crate) fn record_request_at(
        &self,
        req: &NewRequest,
        created_at: NaiveDateTime,
    ) -> Result<i64, DbError> {
        req.validate()?;
        let stamp = created_at.format(TIMESTAMP_FORMAT).to_string();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.prepare_cached(NamedQuery::InsertAt.sql())?.execute(params![
                req.has_color,
                req.has_logo,
                req.size,
                req.response_time_ms,
                stamp
            ])?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    pub fn count_requests(&self) -> Result<i64, DbError> {
        self.with_conn(|conn| count(conn, NamedQuery::Total))
    }

    /// Count requests created at or after `cutoff` (UTC).
    pub fn count_requests_since(&self, cutoff: NaiveDateTime) -> Result<i64, DbError> {
        let stamp = cutoff.format(TIMESTAMP_FORMAT).to_string();
        self.with_conn(|conn| {
            let n = conn
                .prepare_cached(NamedQuery::Since.sql())?
                .query_row([stamp], |row| row.get(0))?;
            Ok(n)
        })
    }

    pub fn count_requests_in(&self, timeframe: Timeframe, now: DateTime<Utc>) -> Result<i64, DbError> {
        self.count_requests_since(timeframe.cutoff(now))
    }

    /// Compute the feature breakdown from a single read snapshot.
    pub fn feature_stats(&self) -> Result<FeatureStats, DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let stats = FeatureStats {
                total: count(&tx, NamedQuery::Total)?,
                with_color: count(&tx, NamedQuery::Color)?,
                with_logo: count(&tx, NamedQuery::Logo)?,
                with_both: count(&tx, NamedQuery::Both)?,
                average_size: average(&tx, NamedQuery::AvgSize)?,
                average_response_time_ms: average(&tx, NamedQuery::AvgResponse)?,
            };
            tx.commit()?;
            Ok(stats)
        })
    }
}

fn count(conn: &Connection, query: NamedQuery) -> Result<i64, DbError> {
    Ok(conn
        .prepare_cached(query.sql())?
        .query_row([], |row| row.get(0))?)
}

fn average(conn: &Connection, query: NamedQuery) -> Result<Option<f64>, DbError> {
    Ok(conn
        .prepare_cached(query.sql())?
        .query_row([], |row| row.get(0))?)
}
