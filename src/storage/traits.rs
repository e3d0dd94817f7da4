//! Registry backend traits

use crate::storage::registry::{ArtifactVersion, Deadline, Result, StageTransition, Tags};

/// Version table and transition log of the lineages in a store.
///
/// Implemented by every backend for standalone calls, and by the view a
/// backend hands to [`RegistryBackend::exclusive`], where each call joins
/// the enclosing section.
pub trait LineageStore {
    /// All versions of a lineage, ascending by version; empty if unknown
    fn versions(&self, lineage: &str) -> Result<Vec<ArtifactVersion>>;

    /// A single version, if present
    fn version(&self, lineage: &str, version: u32) -> Result<Option<ArtifactVersion>>;

    /// Insert a freshly allocated version.
    ///
    /// Fails with `DuplicateSourceRef` if the lineage already holds the
    /// same source reference, and with `Storage` if the id is taken.
    fn insert_version(&self, version: &ArtifactVersion) -> Result<()>;

    /// Write `to_stage` onto the version and append the record to the log
    /// as one unit. Fails with `NotFound` if the version is absent.
    fn apply_transition(&self, transition: &StageTransition) -> Result<()>;
}

/// Persisted registry state: a per-lineage version table, a per-version tag
/// table and the stage transition log.
///
/// Backends hold no business rules. Identifier allocation, duplicate checks
/// and the archive sweep live in the registry components, which run them
/// inside [`RegistryBackend::exclusive`].
pub trait RegistryBackend: LineageStore + Send + Sync {
    /// Run `work` as the only writer of `lineage` among every handle open
    /// on the same store, including handles in other processes.
    ///
    /// Either all writes made through the view are kept or, where the
    /// store supports it, none are. Waiting for another writer past
    /// `deadline` fails with `Timeout`.
    fn exclusive(
        &self,
        lineage: &str,
        deadline: &Deadline,
        work: &mut dyn FnMut(&dyn LineageStore) -> Result<()>,
    ) -> Result<()>;

    /// Names of every lineage with at least one version, sorted
    fn lineages(&self) -> Result<Vec<String>>;

    /// Transition log of a lineage, oldest first
    fn transitions(&self, lineage: &str) -> Result<Vec<StageTransition>>;

    /// Upsert a batch of tags; readers see all of it or none of it.
    /// Fails with `NotFound` if the version is absent.
    fn upsert_tags(&self, lineage: &str, version: u32, tags: &Tags) -> Result<()>;

    /// Tags of one version; empty if the version has none
    fn tags(&self, lineage: &str, version: u32) -> Result<Tags>;

    /// Get backend type name
    fn backend_type(&self) -> &'static str;
}
