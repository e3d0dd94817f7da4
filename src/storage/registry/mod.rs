//! Model registry with archive-on-promote stage transitions
//!
//! Versions of a lineage move between `None`, `Staging`, `Production` and
//! `Archived`. At most one version per lineage holds `Staging` and at most
//! one holds `Production`; promoting a version archives the previous holder
//! before the new one is written.
//!
//! # Example
//!
//! ```ignore
//! use registro::storage::registry::{ModelStage, Registry};
//!
//! let registry = Registry::in_memory();
//! let v1 = registry.register("forecasting", "runs:/abc123/model")?;
//! registry.set_tag("forecasting", v1.version, "metric_mape", "0.15")?;
//! registry.promote("forecasting", v1.version, ModelStage::Production, true)?;
//! let serving = registry.latest("forecasting", Some(&[ModelStage::Production]))?;
//! ```

mod catalog;
mod comparison;
mod deadline;
mod error;
mod facade;
mod lock;
mod metadata;
mod stage;
mod tags;
mod transition;
mod transitioner;
mod version;

// Re-export all public types for API compatibility
pub use catalog::VersionCatalog;
pub use comparison::{MetricGoal, VersionComparison};
pub use deadline::Deadline;
pub use error::{ErrorKind, RegistryError, Result};
pub use facade::Registry;
pub use lock::{LineageGuard, LineageLocks};
pub use metadata::{metric_key, metrics_from_tags, ModelMetadata, METRIC_PREFIX};
pub use stage::ModelStage;
pub use tags::MetadataStore;
pub use transition::{StageTransition, TransitionReport};
pub use transitioner::StageTransitioner;
pub use version::{source_ref_for_run, ArtifactVersion, Tags, VersionRecord};
