//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

use crate::error::Error;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: one row per day, one column (pair) per metric.
    // IF NOT EXISTS adopts databases created before user_version was tracked.
    r#"
    CREATE TABLE IF NOT EXISTS traffic (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp        TEXT UNIQUE,
        clones           INTEGER DEFAULT 0,
        unique_clones    INTEGER DEFAULT 0,
        views            INTEGER DEFAULT 0,
        unique_views     INTEGER DEFAULT 0,
        total_downloads  INTEGER DEFAULT 0,
        total_stars      INTEGER DEFAULT 0
    );
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration).map_err(Error::Schema)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))
                .map_err(Error::Schema)?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    conn.query_row("PRAGMA user_version", [], |r| r.get(0))
        .map_err(Error::Schema)
}
