//! SQLite schema definition and migration.
//!
//! Defines the version, tag and transition tables and handles schema
//! initialization.

use rusqlite::Connection;
use std::time::Duration;

/// Current schema version
pub const CURRENT_VERSION: &str = "1.0.0";

/// Initialize the database schema, creating tables if they don't exist.
///
/// Also configures WAL mode, foreign keys and the busy timeout used when
/// another process holds the write lock.
pub fn init_schema(conn: &Connection, busy_timeout: Duration) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA temp_store = MEMORY;",
    )?;
    conn.busy_timeout(busy_timeout)?;

    conn.execute_batch(SCHEMA_SQL)?;

    // Insert schema version if not present
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))?;
    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [CURRENT_VERSION])?;
    }

    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS versions (
    lineage TEXT NOT NULL,
    version INTEGER NOT NULL,
    source_ref TEXT NOT NULL,
    stage TEXT NOT NULL DEFAULT 'None',
    created_at TEXT NOT NULL,
    PRIMARY KEY (lineage, version),
    UNIQUE (lineage, source_ref)
);
CREATE INDEX IF NOT EXISTS idx_versions_stage ON versions(lineage, stage);

CREATE TABLE IF NOT EXISTS tags (
    lineage TEXT NOT NULL,
    version INTEGER NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (lineage, version, key),
    FOREIGN KEY (lineage, version) REFERENCES versions(lineage, version)
);

CREATE TABLE IF NOT EXISTS transitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lineage TEXT NOT NULL,
    version INTEGER NOT NULL,
    from_stage TEXT NOT NULL,
    to_stage TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    user TEXT,
    reason TEXT,
    FOREIGN KEY (lineage, version) REFERENCES versions(lineage, version)
);
CREATE INDEX IF NOT EXISTS idx_transitions_lineage ON transitions(lineage, id);
";
