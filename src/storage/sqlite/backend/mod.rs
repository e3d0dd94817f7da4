//! SQLite Backend implementation for registry state.
//!
//! Local-first storage using SQLite with WAL mode. Every write that must be
//! observed as a unit (stage write plus history row, tag batches, id
//! allocation) runs in one immediate transaction, and a lineage section holds
//! its transaction from the first read to the last write.

pub(crate) mod schema;
mod sqlite_backend;

pub use sqlite_backend::{SqliteBackend, DEFAULT_BUSY_TIMEOUT};
pub(crate) use sqlite_backend::{
    busy_err, decode_id, decode_stage, decode_timestamp, decode_version, read_version_row,
    sql_err, WRITER_SLOT,
};

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
