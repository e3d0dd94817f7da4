//! Metric comparison between two versions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether larger or smaller metric values are better
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricGoal {
    /// Accuracy-like metrics
    #[default]
    Maximize,
    /// Error-like metrics (mape, rmse, mae)
    Minimize,
}

impl MetricGoal {
    fn improves(&self, diff: f64) -> bool {
        match self {
            MetricGoal::Maximize => diff > 0.0,
            MetricGoal::Minimize => diff < 0.0,
        }
    }
}

/// Comparison between two model versions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionComparison {
    /// First version
    pub v1: u32,
    /// Second version
    pub v2: u32,
    /// v2 - v1 for every metric both versions carry
    pub metric_diffs: BTreeMap<String, f64>,
    /// Metrics carried by only one of the two versions
    pub unmatched: Vec<String>,
    /// Whether v2 improves a strict majority of shared metrics
    pub v2_is_better: bool,
    /// Summary of changes
    pub summary: String,
}

impl VersionComparison {
    pub fn compute(
        v1: u32,
        m1: &BTreeMap<String, f64>,
        v2: u32,
        m2: &BTreeMap<String, f64>,
        goal: MetricGoal,
    ) -> Self {
        let mut metric_diffs = BTreeMap::new();
        let mut unmatched = Vec::new();

        for (name, a) in m1 {
            match m2.get(name) {
                Some(b) => {
                    metric_diffs.insert(name.clone(), b - a);
                }
                None => unmatched.push(name.clone()),
            }
        }
        unmatched.extend(m2.keys().filter(|name| !m1.contains_key(*name)).cloned());
        unmatched.sort();

        let total = metric_diffs.len();
        let improved = metric_diffs.values().filter(|d| goal.improves(**d)).count();
        let v2_is_better = total > 0 && improved * 2 > total;

        let summary = if v2_is_better {
            format!("Version {v2} is better than {v1} on {improved}/{total} metrics")
        } else {
            format!("Version {v2} is not definitively better than {v1}")
        };

        Self { v1, v2, metric_diffs, unmatched, v2_is_better, summary }
    }
}
