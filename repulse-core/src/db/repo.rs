//! Database repository layer
//!
//! Provides the per-day upsert and the read queries over the `traffic` table.

use crate::error::Result;
use crate::traffic::{DailyRecord, ResourceKind};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;

/// Columns a metric owns in the `traffic` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
    /// Daily count plus daily uniques
    Historical {
        count: &'static str,
        uniques: &'static str,
    },
    /// A single running total
    Snapshot { total: &'static str },
}

/// Map a kind to the columns it writes
pub fn columns(kind: ResourceKind) -> Columns {
    match kind {
        ResourceKind::Clones => Columns::Historical {
            count: "clones",
            uniques: "unique_clones",
        },
        ResourceKind::Views => Columns::Historical {
            count: "views",
            uniques: "unique_views",
        },
        ResourceKind::Downloads => Columns::Snapshot {
            total: "total_downloads",
        },
        ResourceKind::Stars => Columns::Snapshot {
            total: "total_stars",
        },
    }
}

fn upsert_sql(columns: Columns) -> String {
    match columns {
        Columns::Historical { count, uniques } => format!(
            r#"
            INSERT INTO traffic (timestamp, {count}, {uniques})
            VALUES (?1, ?2, ?3)
            ON CONFLICT(timestamp) DO UPDATE SET
                {count} = excluded.{count},
                {uniques} = excluded.{uniques}
            "#
        ),
        Columns::Snapshot { total } => format!(
            r#"
            INSERT INTO traffic (timestamp, {total})
            VALUES (?1, ?2)
            ON CONFLICT(timestamp) DO UPDATE SET
                {total} = excluded.{total}
            "#
        ),
    }
}

/// One stored day across every metric
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrafficRow {
    pub timestamp: String,
    pub clones: u64,
    pub unique_clones: u64,
    pub views: u64,
    pub unique_views: u64,
    pub total_downloads: u64,
    pub total_stars: u64,
}

const ROW_COLUMNS: &str = "timestamp, clones, unique_clones, views, unique_views, \
                           total_downloads, total_stars";

/// Database handle holding a single connection
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Ensure the traffic table exists
    pub fn migrate(&self) -> Result<()> {
        super::schema::run_migrations(&self.conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ============================================
    // Upserts
    // ============================================

    /// Insert or update one row per record, touching only `kind`'s columns.
    ///
    /// Returns the number of statements executed.
    pub fn upsert_records(&self, kind: ResourceKind, records: &[DailyRecord]) -> Result<usize> {
        if records.is_empty() {
            tracing::debug!(kind = %kind, "No records to store");
            return Ok(0);
        }

        let columns = columns(kind);
        let mut stmt = self.conn.prepare(&upsert_sql(columns))?;

        for record in records {
            match columns {
                Columns::Historical { .. } => stmt.execute(params![
                    record.timestamp,
                    record.count,
                    record.uniques.unwrap_or(0)
                ])?,
                Columns::Snapshot { .. } => {
                    stmt.execute(params![record.timestamp, record.count])?
                }
            };
        }

        tracing::info!(kind = %kind, rows = records.len(), "Stored records");
        Ok(records.len())
    }

    // ============================================
    // Queries
    // ============================================

    /// Fetch the stored row for one day
    pub fn get_day(&self, timestamp: &str) -> Result<Option<TrafficRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ROW_COLUMNS} FROM traffic WHERE timestamp = ?1"),
                [timestamp],
                Self::row_to_traffic,
            )
            .optional()?;
        Ok(row)
    }

    /// Most recent days first, up to `limit` when given
    pub fn list_days(&self, limit: Option<usize>) -> Result<Vec<TrafficRow>> {
        let limit = limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM traffic ORDER BY timestamp DESC LIMIT ?1"
        ))?;

        let rows = stmt
            .query_map([limit], Self::row_to_traffic)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Number of stored days
    pub fn count_days(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM traffic", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_traffic(row: &Row) -> rusqlite::Result<TrafficRow> {
        Ok(TrafficRow {
            timestamp: row.get(0)?,
            clones: row.get::<_, Option<u64>>(1)?.unwrap_or(0),
            unique_clones: row.get::<_, Option<u64>>(2)?.unwrap_or(0),
            views: row.get::<_, Option<u64>>(3)?.unwrap_or(0),
            unique_views: row.get::<_, Option<u64>>(4)?.unwrap_or(0),
            total_downloads: row.get::<_, Option<u64>>(5)?.unwrap_or(0),
            total_stars: row.get::<_, Option<u64>>(6)?.unwrap_or(0),
        })
    }
}
