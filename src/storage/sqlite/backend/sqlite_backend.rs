//! SQLite Backend core implementation.
//!
//! Contains the SqliteBackend struct, connection handling and row decoding.

use super::schema::init_schema;
use crate::storage::registry::{ArtifactVersion, LineageLocks, ModelStage, RegistryError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Busy timeout used when none is configured
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Key of the single in-process writer slot; one connection writes serially
pub(crate) const WRITER_SLOT: &str = "";

/// SQLite backend for registry state.
///
/// Every write runs in a `BEGIN IMMEDIATE` transaction, which SQLite grants
/// to one connection at a time across all processes sharing the file. An
/// exclusive lineage section is one such transaction.
#[derive(Debug)]
pub struct SqliteBackend {
    pub(crate) path: String,
    pub(crate) conn: Mutex<Connection>,
    pub(crate) busy_timeout: Duration,
    /// Lets threads queue for the connection with a deadline instead of
    /// blocking on the mutex while another section is open
    pub(crate) writer: LineageLocks,
}

impl SqliteBackend {
    /// Open or create a SQLite database at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file (use ":memory:" for in-memory)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open with an explicit busy timeout for contended writes
    pub fn open_with_busy_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let conn = if path_str == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path.as_ref())
        }
        .map_err(sql_err("Failed to open database"))?;

        init_schema(&conn, busy_timeout).map_err(sql_err("Failed to initialize schema"))?;

        tracing::debug!(path = %path_str, "opened sqlite registry store");
        Ok(Self {
            path: path_str,
            conn: Mutex::new(conn),
            busy_timeout,
            writer: LineageLocks::new(),
        })
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Get the database path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RegistryError::Storage(format!("Failed to acquire connection lock: {e}")))
    }

    /// Take the database write lock, waiting for other writers at most `wait`
    pub(crate) fn begin_immediate<'c>(
        conn: &'c mut Connection,
        wait: Duration,
    ) -> Result<Transaction<'c>> {
        conn.busy_timeout(wait).map_err(sql_err("Failed to set busy timeout"))?;
        conn.transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(busy_err("begin transaction", wait))
    }
}

/// Map a rusqlite error into a storage error with context
pub(crate) fn sql_err(context: &'static str) -> impl Fn(rusqlite::Error) -> RegistryError {
    move |e| RegistryError::Storage(format!("{context}: {e}"))
}

/// Whether SQLite gave up waiting for another connection's lock
pub(crate) fn is_busy(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(failure.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Like [`sql_err`], but lock contention past `waited` becomes `Timeout`
pub(crate) fn busy_err(
    operation: &'static str,
    waited: Duration,
) -> impl Fn(rusqlite::Error) -> RegistryError {
    move |e| {
        if is_busy(&e) {
            RegistryError::Timeout { operation, timeout: waited }
        } else {
            RegistryError::Storage(format!("Failed to {operation}: {e}"))
        }
    }
}

/// Raw `versions` row before decoding
pub(crate) type VersionRow = (String, i64, String, String, String);

pub(crate) fn read_version_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VersionRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

pub(crate) fn decode_version(row: VersionRow) -> Result<ArtifactVersion> {
    let (lineage, version, source_ref, stage, created_at) = row;
    Ok(ArtifactVersion {
        lineage,
        version: decode_id(version)?,
        source_ref,
        stage: decode_stage(&stage)?,
        created_at: decode_timestamp(&created_at)?,
    })
}

pub(crate) fn decode_id(raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| RegistryError::Storage(format!("Corrupt version id: {raw}")))
}

pub(crate) fn decode_stage(raw: &str) -> Result<ModelStage> {
    raw.parse().map_err(|_| RegistryError::Storage(format!("Corrupt stage value: {raw}")))
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RegistryError::Storage(format!("Corrupt timestamp '{raw}': {e}")))
}
