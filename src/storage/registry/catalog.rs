//! Version catalog: the set of known versions per lineage

use std::sync::Arc;

use super::deadline::Deadline;
use super::error::{RegistryError, Result};
use super::stage::ModelStage;
use super::transition::StageTransition;
use super::version::ArtifactVersion;
use crate::storage::traits::{LineageStore, RegistryBackend};

/// Allocates version identifiers and tracks each version's stage and source
pub struct VersionCatalog {
    backend: Arc<dyn RegistryBackend>,
}

impl VersionCatalog {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self { backend }
    }

    /// Register a new version of `lineage` produced by `source_ref`.
    ///
    /// Identifiers start at 1 and grow by one per registration. A source
    /// reference can be registered only once per lineage. The duplicate
    /// check, allocation and insert run in one exclusive section, so
    /// concurrent registrations through any handle get distinct ids.
    pub fn register(
        &self,
        lineage: &str,
        source_ref: &str,
        deadline: &Deadline,
    ) -> Result<ArtifactVersion> {
        let version = self.in_section(lineage, deadline, "register", |store| {
            let existing = store.versions(lineage)?;
            if let Some(dup) = existing.iter().find(|v| v.source_ref == source_ref) {
                return Err(RegistryError::DuplicateSourceRef {
                    lineage: lineage.to_string(),
                    source_ref: source_ref.to_string(),
                    existing: dup.version,
                });
            }

            let next = match existing.iter().map(|v| v.version).max() {
                Some(last) => last.checked_add(1).ok_or_else(|| {
                    RegistryError::Storage(format!("Version ids exhausted for {lineage}"))
                })?,
                None => 1,
            };

            deadline.check("register")?;
            let version = ArtifactVersion::new(lineage, next, source_ref);
            store.insert_version(&version)?;
            Ok(version)
        })?;

        tracing::info!(lineage, version = version.version, source_ref, "registered version");
        Ok(version)
    }

    /// Get a single version
    pub fn get(&self, lineage: &str, version: u32) -> Result<ArtifactVersion> {
        Self::get_in(self.backend.as_ref(), lineage, version)
    }

    /// Versions of a lineage ascending by id, optionally restricted to `stages`
    pub fn list(
        &self,
        lineage: &str,
        stages: Option<&[ModelStage]>,
    ) -> Result<Vec<ArtifactVersion>> {
        Self::list_in(self.backend.as_ref(), lineage, stages)
    }

    /// Names of all lineages
    pub fn lineages(&self) -> Result<Vec<String>> {
        self.backend.lineages()
    }

    /// Stage transition log of a lineage, oldest first
    pub fn history(&self, lineage: &str) -> Result<Vec<StageTransition>> {
        let history = self.backend.transitions(lineage)?;
        if history.is_empty() && self.backend.versions(lineage)?.is_empty() {
            return Err(RegistryError::LineageNotFound(lineage.to_string()));
        }
        Ok(history)
    }

    /// Run `work` as the only writer of `lineage`.
    ///
    /// Fails with `Timeout` if the section cannot be entered before
    /// `deadline`. Whatever `work` returns is passed through.
    pub(crate) fn in_section<T>(
        &self,
        lineage: &str,
        deadline: &Deadline,
        operation: &'static str,
        work: impl FnOnce(&dyn LineageStore) -> Result<T>,
    ) -> Result<T> {
        deadline.check(operation)?;

        let mut work = Some(work);
        let mut output = None;
        self.backend.exclusive(lineage, deadline, &mut |store: &dyn LineageStore| {
            let work = work.take().ok_or_else(|| {
                RegistryError::Storage(format!("Lineage section for {lineage} entered twice"))
            })?;
            output = Some(work(store)?);
            Ok(())
        })?;

        output.ok_or_else(|| {
            RegistryError::Storage(format!("Lineage section for {lineage} did not run"))
        })
    }

    pub(crate) fn get_in<S: LineageStore + ?Sized>(
        store: &S,
        lineage: &str,
        version: u32,
    ) -> Result<ArtifactVersion> {
        store
            .version(lineage, version)?
            .ok_or_else(|| RegistryError::version_not_found(lineage, version))
    }

    pub(crate) fn list_in<S: LineageStore + ?Sized>(
        store: &S,
        lineage: &str,
        stages: Option<&[ModelStage]>,
    ) -> Result<Vec<ArtifactVersion>> {
        let versions = store.versions(lineage)?;
        if versions.is_empty() {
            return Err(RegistryError::LineageNotFound(lineage.to_string()));
        }

        Ok(match stages {
            Some(stages) => versions.into_iter().filter(|v| stages.contains(&v.stage)).collect(),
            None => versions,
        })
    }

    /// Write a stage unconditionally. Legality is the transitioner's job;
    /// callers must be inside the lineage section.
    pub(crate) fn write_stage<S: LineageStore + ?Sized>(
        store: &S,
        current: &ArtifactVersion,
        stage: ModelStage,
        user: Option<&str>,
        reason: Option<&str>,
    ) -> Result<StageTransition> {
        let transition =
            StageTransition::new(&current.lineage, current.version, current.stage, stage)
                .with_user(user)
                .with_reason(reason);
        store.apply_transition(&transition)?;
        Ok(transition)
    }

    /// Set a stage outside the transition protocol
    #[cfg(test)]
    pub(crate) fn set_stage(
        &self,
        lineage: &str,
        version: u32,
        stage: ModelStage,
        user: Option<&str>,
        reason: Option<&str>,
    ) -> Result<StageTransition> {
        self.in_section(lineage, &Deadline::never(), "set stage", |store| {
            let current = Self::get_in(store, lineage, version)?;
            Self::write_stage(store, &current, stage, user, reason)
        })
    }
}
