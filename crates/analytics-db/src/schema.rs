//! Database schema definitions and migrations.

use rusqlite::Connection;

use crate::DbError;

pub fn run_migrations(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// `created_at` is stored as UTC text (`YYYY-MM-DD HH:MM:SS`) so range
/// filters compare lexicographically and can use the index.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS qr_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    has_color BOOLEAN NOT NULL DEFAULT false,
    has_logo BOOLEAN NOT NULL DEFAULT false,
    size INTEGER NOT NULL,
    response_time_ms INTEGER NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_qr_requests_created_at ON qr_requests(created_at);
"#;
