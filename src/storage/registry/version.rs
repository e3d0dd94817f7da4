//! Artifact version records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::stage::ModelStage;

/// Tags attached to a version, ordered by key
pub type Tags = BTreeMap<String, String>;

/// One registered version of a lineage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    /// Lineage name
    pub lineage: String,
    /// Version number (monotonically increasing per lineage)
    pub version: u32,
    /// Producing run or build
    pub source_ref: String,
    /// Current stage
    pub stage: ModelStage,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ArtifactVersion {
    /// Create a new version in stage `None`
    pub fn new(lineage: &str, version: u32, source_ref: &str) -> Self {
        Self {
            lineage: lineage.to_string(),
            version,
            source_ref: source_ref.to_string(),
            stage: ModelStage::None,
            created_at: Utc::now(),
        }
    }
}

/// A version joined with its tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(flatten)]
    pub version: ArtifactVersion,
    pub tags: Tags,
}

/// Build the source reference for an artifact logged by a tracking run
pub fn source_ref_for_run(run_id: &str, artifact_path: &str) -> String {
    format!("runs:/{run_id}/{}", artifact_path.trim_start_matches('/'))
}
