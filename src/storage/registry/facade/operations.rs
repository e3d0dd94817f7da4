//! Registry operations: register, tag, transition, query

use std::collections::BTreeMap;

use super::super::comparison::{MetricGoal, VersionComparison};
use super::super::error::{RegistryError, Result};
use super::super::metadata::{metrics_from_tags, ModelMetadata};
use super::super::stage::ModelStage;
use super::super::transition::{StageTransition, TransitionReport};
use super::super::version::{ArtifactVersion, Tags, VersionRecord};
use super::handle::Registry;

impl Registry {
    /// Register a new version with no tags
    pub fn register(&self, lineage: &str, source_ref: &str) -> Result<ArtifactVersion> {
        self.catalog.register(lineage, source_ref, &self.deadline())
    }

    /// Register a new version and attach `tags` to it.
    ///
    /// If registration succeeds but tagging fails, the version exists and
    /// the error is `PartiallyRegistered`; retry with
    /// [`Registry::tag_version`], not another registration.
    pub fn register_with_metadata(
        &self,
        lineage: &str,
        source_ref: &str,
        tags: &Tags,
    ) -> Result<ArtifactVersion> {
        let deadline = self.deadline();
        let version = self.catalog.register(lineage, source_ref, &deadline)?;

        if !tags.is_empty() {
            self.metadata.bulk_set_tags(lineage, version.version, tags, &deadline).map_err(
                |source| {
                    tracing::warn!(
                        lineage,
                        version = version.version,
                        error = %source,
                        "version registered but tagging failed"
                    );
                    RegistryError::PartiallyRegistered {
                        lineage: lineage.to_string(),
                        version: version.version,
                        source: Box::new(source),
                    }
                },
            )?;
        }

        Ok(version)
    }

    /// Register a new version described by structured model metadata
    pub fn register_model(
        &self,
        lineage: &str,
        source_ref: &str,
        metadata: &ModelMetadata,
    ) -> Result<ArtifactVersion> {
        self.register_with_metadata(lineage, source_ref, &metadata.to_tags())
    }

    /// Set one tag (last write wins)
    pub fn set_tag(&self, lineage: &str, version: u32, key: &str, value: &str) -> Result<()> {
        self.metadata.set_tag(lineage, version, key, value, &self.deadline())
    }

    /// Set a batch of tags atomically
    pub fn tag_version(&self, lineage: &str, version: u32, tags: &Tags) -> Result<()> {
        self.metadata.bulk_set_tags(lineage, version, tags, &self.deadline())
    }

    /// All tags of a version
    pub fn get_tags(&self, lineage: &str, version: u32) -> Result<Tags> {
        self.metadata.get_tags(lineage, version)
    }

    /// Get a single version
    pub fn get(&self, lineage: &str, version: u32) -> Result<ArtifactVersion> {
        self.catalog.get(lineage, version)
    }

    /// Versions of a lineage ascending by id, optionally filtered by stage
    pub fn list(&self, lineage: &str, stages: Option<&[ModelStage]>) -> Result<Vec<ArtifactVersion>> {
        self.catalog.list(lineage, stages)
    }

    /// Names of all lineages
    pub fn lineages(&self) -> Result<Vec<String>> {
        self.catalog.lineages()
    }

    /// Move a version into `stage`, archiving other holders of an exclusive
    /// stage first when `archive_existing` is set
    pub fn promote(
        &self,
        lineage: &str,
        version: u32,
        stage: ModelStage,
        archive_existing: bool,
    ) -> Result<TransitionReport> {
        self.transitioner.transition(
            lineage,
            version,
            stage,
            archive_existing,
            &self.deadline(),
            self.actor.as_deref(),
        )
    }

    /// [`Registry::promote`] with the configured archive default
    pub fn transition(&self, lineage: &str, version: u32, stage: ModelStage) -> Result<TransitionReport> {
        self.promote(lineage, version, stage, self.archive_existing)
    }

    /// Latest version in each requested stage (every stage if `None`),
    /// joined with its tags, ascending by version.
    ///
    /// Only the newest version of a stage is returned, so `Archived` and
    /// `None` yield at most one entry each. Use [`Registry::list`] and
    /// [`Registry::get_tags`] for every version in a set of stages.
    pub fn latest(&self, lineage: &str, stages: Option<&[ModelStage]>) -> Result<Vec<VersionRecord>> {
        let mut newest: BTreeMap<ModelStage, ArtifactVersion> = BTreeMap::new();
        for version in self.catalog.list(lineage, stages)? {
            let newer = newest.get(&version.stage).map_or(true, |seen| seen.version < version.version);
            if newer {
                newest.insert(version.stage, version);
            }
        }

        let mut latest: Vec<_> = newest.into_values().collect();
        latest.sort_by_key(|v| v.version);

        latest
            .into_iter()
            .map(|version| -> Result<VersionRecord> {
                let tags = self.metadata.get_tags(lineage, version.version)?;
                Ok(VersionRecord { version, tags })
            })
            .collect()
    }

    /// Stage transition log of a lineage, oldest first
    pub fn history(&self, lineage: &str) -> Result<Vec<StageTransition>> {
        self.catalog.history(lineage)
    }

    /// Compare the `metric_*` tags of two versions
    pub fn compare_versions(
        &self,
        lineage: &str,
        v1: u32,
        v2: u32,
        goal: MetricGoal,
    ) -> Result<VersionComparison> {
        let m1 = metrics_from_tags(&self.get_tags(lineage, v1)?);
        let m2 = metrics_from_tags(&self.get_tags(lineage, v2)?);
        Ok(VersionComparison::compute(v1, &m1, v2, &m2, goal))
    }
}
