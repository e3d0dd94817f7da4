//! Stage transition records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::ModelStage;

/// Stage transition record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Lineage name
    pub lineage: String,
    /// Version
    pub version: u32,
    /// Previous stage
    pub from_stage: ModelStage,
    /// New stage
    pub to_stage: ModelStage,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// User who made the transition
    pub user: Option<String>,
    /// Reason for transition
    pub reason: Option<String>,
}

impl StageTransition {
    pub fn new(lineage: &str, version: u32, from_stage: ModelStage, to_stage: ModelStage) -> Self {
        Self {
            lineage: lineage.to_string(),
            version,
            from_stage,
            to_stage,
            timestamp: Utc::now(),
            user: None,
            reason: None,
        }
    }

    pub fn with_user(mut self, user: Option<&str>) -> Self {
        self.user = user.map(ToString::to_string);
        self
    }

    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(ToString::to_string);
        self
    }
}

/// Outcome of a completed transition call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    pub lineage: String,
    pub version: u32,
    pub from_stage: ModelStage,
    pub to_stage: ModelStage,
    /// Versions demoted to `Archived` by the sweep, ascending
    pub archived: Vec<u32>,
}

impl TransitionReport {
    /// True when the target was already in the requested stage
    pub fn was_noop(&self) -> bool {
        self.from_stage == self.to_stage
    }
}
