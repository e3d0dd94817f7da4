//! SQLite backend for registry state
//!
//! Local-first storage using SQLite with WAL mode. The persisted layout is a
//! per-lineage `versions` table, a per-version `tags` table and an
//! append-only `transitions` log.
//!
//! # Example
//!
//! ```ignore
//! use registro::storage::{RegistryBackend, SqliteBackend};
//!
//! let backend = SqliteBackend::open("./registry.db")?;
//! let lineages = backend.lineages()?;
//! ```

mod backend;
mod queries;

pub use backend::{SqliteBackend, DEFAULT_BUSY_TIMEOUT};
