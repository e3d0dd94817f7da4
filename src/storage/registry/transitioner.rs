//! Archive-on-promote stage transitions
//!
//! A promotion into `Staging` or `Production` first demotes every other
//! version holding that stage, and only then writes the target. The sweep
//! and the promotion run in one exclusive section of the backend; on a
//! transactional store a failure anywhere in it leaves the lineage as it
//! was. Without rollback, demotion still precedes promotion, so an
//! interrupted call can leave zero active versions in a stage but never two.

use std::sync::Arc;

use super::catalog::VersionCatalog;
use super::deadline::Deadline;
use super::error::{RegistryError, Result};
use super::stage::ModelStage;
use super::transition::TransitionReport;
use crate::storage::traits::LineageStore;

/// The only writer of version stages
#[derive(Clone)]
pub struct StageTransitioner {
    catalog: Arc<VersionCatalog>,
}

impl StageTransitioner {
    pub fn new(catalog: Arc<VersionCatalog>) -> Self {
        Self { catalog }
    }

    /// Move `version` into `target`.
    ///
    /// With `archive_existing`, other versions already in an exclusive
    /// target stage are archived first; if any of them cannot be archived
    /// the call fails with `PartialTransitionFailure` and the target keeps
    /// its stage. Transitioning into the current stage is a no-op that
    /// still runs the sweep.
    pub fn transition(
        &self,
        lineage: &str,
        version: u32,
        target: ModelStage,
        archive_existing: bool,
        deadline: &Deadline,
        user: Option<&str>,
    ) -> Result<TransitionReport> {
        let report = self.catalog.in_section(lineage, deadline, "transition", |store| {
            let current = VersionCatalog::get_in(store, lineage, version)?;

            let archived = if archive_existing && target.is_exclusive() {
                Self::archive_sweep(store, lineage, version, target, deadline, user).map_err(
                    |source| RegistryError::PartialTransitionFailure {
                        lineage: lineage.to_string(),
                        version,
                        source: Box::new(source),
                    },
                )?
            } else {
                Vec::new()
            };

            deadline.check("transition")?;

            if current.stage != target {
                VersionCatalog::write_stage(store, &current, target, user, None)?;
            }

            Ok(TransitionReport {
                lineage: lineage.to_string(),
                version,
                from_stage: current.stage,
                to_stage: target,
                archived,
            })
        });

        match &report {
            Ok(report) => {
                for archived in &report.archived {
                    tracing::info!(lineage, version = archived, from = %target, "archived version");
                }
                if report.was_noop() {
                    tracing::debug!(lineage, version, %target, "version already in target stage");
                } else {
                    tracing::info!(lineage, version, from = %report.from_stage, to = %target, "transitioned version");
                }
            }
            Err(error @ RegistryError::PartialTransitionFailure { .. }) => {
                tracing::warn!(lineage, version, %target, %error, "archive sweep failed");
            }
            Err(_) => {}
        }
        report
    }

    /// Archive every version other than `keep` that holds `stage`.
    ///
    /// All of them are archived, not just the first one found.
    fn archive_sweep(
        store: &dyn LineageStore,
        lineage: &str,
        keep: u32,
        stage: ModelStage,
        deadline: &Deadline,
        user: Option<&str>,
    ) -> Result<Vec<u32>> {
        let conflicts = VersionCatalog::list_in(store, lineage, Some(&[stage]))?;
        let reason = format!("archived by promotion of v{keep} to {stage}");

        let mut archived = Vec::new();
        for other in conflicts.iter().filter(|v| v.version != keep) {
            deadline.check("archive sweep")?;
            VersionCatalog::write_stage(store, other, ModelStage::Archived, user, Some(&reason))?;
            archived.push(other.version);
        }
        Ok(archived)
    }
}
