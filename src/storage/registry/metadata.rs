//! Structured model metadata flattened into version tags

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::version::Tags;

/// Prefix of tags holding performance metrics
pub const METRIC_PREFIX: &str = "metric_";

/// Tag key for a metric name
pub fn metric_key(name: &str) -> String {
    format!("{METRIC_PREFIX}{name}")
}

/// Numeric `metric_*` tags, keyed by metric name. Values that do not parse
/// as numbers are skipped.
pub fn metrics_from_tags(tags: &Tags) -> BTreeMap<String, f64> {
    tags.iter()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix(METRIC_PREFIX)?;
            let value = value.trim().parse::<f64>().ok()?;
            Some((name.to_string(), value))
        })
        .collect()
}

/// Metadata recorded for a trained model version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model family, e.g. "forecasting", "causal", "rl"
    pub model_type: String,
    pub experiment_id: String,
    #[serde(default)]
    pub performance_metrics: BTreeMap<String, f64>,
    pub training_dataset: String,
    #[serde(default)]
    pub model_parameters: Map<String, Value>,
    pub created_by: String,
}

impl ModelMetadata {
    pub fn new(model_type: &str, experiment_id: &str, training_dataset: &str, created_by: &str) -> Self {
        Self {
            model_type: model_type.to_string(),
            experiment_id: experiment_id.to_string(),
            training_dataset: training_dataset.to_string(),
            created_by: created_by.to_string(),
            ..Self::default()
        }
    }

    /// Add a performance metric
    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.performance_metrics.insert(name.to_string(), value);
        self
    }

    /// Add a training parameter
    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.model_parameters.insert(name.to_string(), value.into());
        self
    }

    /// Flatten into tags, stamping `creation_timestamp` with the current time
    pub fn to_tags(&self) -> Tags {
        let mut tags = Tags::new();
        tags.insert("model_type".into(), self.model_type.clone());
        tags.insert("experiment_id".into(), self.experiment_id.clone());
        tags.insert("training_dataset".into(), self.training_dataset.clone());
        tags.insert("created_by".into(), self.created_by.clone());
        tags.insert("creation_timestamp".into(), Utc::now().to_rfc3339());
        tags.insert(
            "model_parameters".into(),
            Value::Object(self.model_parameters.clone()).to_string(),
        );

        for (name, value) in &self.performance_metrics {
            tags.insert(metric_key(name), value.to_string());
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecasting() -> ModelMetadata {
        ModelMetadata::new("forecasting", "exp_123", "sales_data_2024_q1", "data_scientist_1")
            .with_metric("mape", 0.15)
            .with_metric("rmse", 0.08)
            .with_parameter("n_estimators", 100)
            .with_parameter("learning_rate", 0.01)
    }

    #[test]
    fn test_fixed_fields_become_tags() {
        let tags = forecasting().to_tags();
        assert_eq!(tags["model_type"], "forecasting");
        assert_eq!(tags["experiment_id"], "exp_123");
        assert_eq!(tags["training_dataset"], "sales_data_2024_q1");
        assert_eq!(tags["created_by"], "data_scientist_1");
        assert!(tags.contains_key("creation_timestamp"));
    }

    #[test]
    fn test_metrics_become_prefixed_tags() {
        let tags = forecasting().to_tags();
        assert_eq!(tags["metric_mape"], "0.15");
        assert_eq!(tags["metric_rmse"], "0.08");
    }

    #[test]
    fn test_parameters_serialized_as_json() {
        let tags = forecasting().to_tags();
        let params: Value = serde_json::from_str(&tags["model_parameters"]).unwrap();
        assert_eq!(params["n_estimators"], 100);
        assert_eq!(params["learning_rate"], 0.01);
    }

    #[test]
    fn test_metrics_from_tags_round_trip() {
        let tags = forecasting().to_tags();
        let metrics = metrics_from_tags(&tags);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["mape"], 0.15);
    }

    #[test]
    fn test_metrics_from_tags_skips_non_numeric() {
        let mut tags = Tags::new();
        tags.insert("metric_notes".into(), "good".into());
        tags.insert("metric_mae".into(), " 0.12 ".into());
        tags.insert("model_type".into(), "rl".into());
        let metrics = metrics_from_tags(&tags);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics["mae"], 0.12);
    }

    #[test]
    fn test_metadata_from_yaml() {
        let yaml = r#"
model_type: forecasting
experiment_id: exp_9
training_dataset: glucose_2024
created_by: ci
performance_metrics:
  mape: 0.2
"#;
        let metadata: ModelMetadata = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(metadata.performance_metrics["mape"], 0.2);
        assert!(metadata.model_parameters.is_empty());
    }
}
