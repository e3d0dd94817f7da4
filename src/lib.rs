//! Registro: model version registry
//!
//! Tracks immutable, sequentially numbered versions of model lineages and
//! moves them between lifecycle stages. `Staging` and `Production` are
//! exclusive per lineage: promoting a version archives whoever held the
//! stage before. Every change is recorded in a per-lineage transition log.
//!
//! # Modules
//!
//! - [`storage`]: the registry and its in-memory and SQLite backends
//! - [`config`]: YAML configuration and CLI arguments
//! - [`cli`]: command handlers for the `registro` binary
//!
//! # Example
//!
//! ```
//! use registro::storage::{ModelStage, Registry};
//!
//! let registry = Registry::in_memory();
//! let v1 = registry.register("forecasting", "runs:/a/model").unwrap();
//! let v2 = registry.register("forecasting", "runs:/b/model").unwrap();
//! registry.promote("forecasting", v1.version, ModelStage::Production, true).unwrap();
//!
//! let report = registry.promote("forecasting", v2.version, ModelStage::Production, true).unwrap();
//! assert_eq!(report.archived, vec![v1.version]);
//! ```

pub mod cli;
pub mod config;
pub mod storage;

pub use config::RegistryConfig;
pub use storage::registry::{
    ArtifactVersion, Deadline, ErrorKind, MetricGoal, ModelMetadata, StageTransition,
    TransitionReport, VersionComparison, VersionRecord,
};
pub use storage::{LineageStore, ModelStage, Registry, RegistryBackend, RegistryError, Result};
