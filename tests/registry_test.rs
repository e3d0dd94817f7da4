//! Integration tests for the registry lifecycle over both backends

use std::sync::Arc;

use registro::storage::registry::ModelMetadata;
use registro::storage::{MemoryBackend, SqliteBackend};
use registro::{ErrorKind, MetricGoal, ModelStage, Registry, RegistryBackend, RegistryConfig};
use tempfile::TempDir;

fn backends(dir: &TempDir) -> Vec<Arc<dyn RegistryBackend>> {
    vec![
        Arc::new(MemoryBackend::new()),
        Arc::new(
            SqliteBackend::open(dir.path().join("registry.db")).expect("operation should succeed"),
        ),
    ]
}

#[test]
fn test_full_promotion_lifecycle() {
    let dir = TempDir::new().expect("temp dir should be created");

    for backend in backends(&dir) {
        let kind = backend.backend_type();
        let registry = Registry::new(backend).with_actor("release-bot");

        // Register three versions
        for run in ["a", "b", "c"] {
            registry
                .register("forecasting", &format!("runs:/{run}/model"))
                .expect("operation should succeed");
        }
        let versions = registry.list("forecasting", None).expect("operation should succeed");
        assert_eq!(
            versions.iter().map(|v| v.version).collect::<Vec<_>>(),
            vec![1, 2, 3],
            "{kind}"
        );
        assert!(versions.iter().all(|v| v.stage == ModelStage::None));

        // v1 to Production, v2 to Staging
        registry
            .promote("forecasting", 1, ModelStage::Production, true)
            .expect("operation should succeed");
        registry
            .promote("forecasting", 2, ModelStage::Staging, true)
            .expect("operation should succeed");

        // v2 replaces v1 in Production
        let report = registry
            .promote("forecasting", 2, ModelStage::Production, true)
            .expect("operation should succeed");
        assert_eq!(report.from_stage, ModelStage::Staging);
        assert_eq!(report.archived, vec![1], "{kind}");

        // v3 to Staging
        registry
            .promote("forecasting", 3, ModelStage::Staging, true)
            .expect("operation should succeed");

        let stage_of = |v| registry.get("forecasting", v).expect("version should exist").stage;
        assert_eq!(stage_of(1), ModelStage::Archived);
        assert_eq!(stage_of(2), ModelStage::Production);
        assert_eq!(stage_of(3), ModelStage::Staging);

        let latest = registry
            .latest("forecasting", Some(&[ModelStage::Production]))
            .expect("operation should succeed");
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].version.version, 2);

        let history = registry.history("forecasting").expect("operation should succeed");
        assert_eq!(history.len(), 5, "{kind}");
        assert!(history.iter().all(|t| t.user.as_deref() == Some("release-bot")));
        let archive = &history[2];
        assert_eq!((archive.version, archive.to_stage), (1, ModelStage::Archived));
        assert!(archive.reason.is_some());
    }
}

#[test]
fn test_duplicate_source_ref_rejected_per_lineage() {
    let dir = TempDir::new().expect("temp dir should be created");

    for backend in backends(&dir) {
        let registry = Registry::new(backend);
        registry.register("a", "s3://models/x").expect("operation should succeed");

        let err = registry.register("a", "s3://models/x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSourceRef);

        // Same source under another lineage is fine
        let other = registry.register("b", "s3://models/x").expect("operation should succeed");
        assert_eq!(other.version, 1);
    }
}

#[test]
fn test_metadata_and_comparison() {
    let registry = Registry::in_memory();

    let v1 = registry
        .register_model(
            "forecasting",
            "runs:/a/model",
            &ModelMetadata::new("forecasting", "exp-1", "sales-2025", "alice")
                .with_metric("mape", 0.15)
                .with_metric("rmse", 0.08),
        )
        .expect("operation should succeed");
    let v2 = registry
        .register_model(
            "forecasting",
            "runs:/b/model",
            &ModelMetadata::new("forecasting", "exp-1", "sales-2025", "alice")
                .with_metric("mape", 0.12)
                .with_metric("rmse", 0.07),
        )
        .expect("operation should succeed");

    let cmp = registry
        .compare_versions("forecasting", v1.version, v2.version, MetricGoal::Minimize)
        .expect("operation should succeed");
    assert!(cmp.v2_is_better);
    assert_eq!(cmp.metric_diffs.len(), 2);

    let cmp = registry
        .compare_versions("forecasting", v1.version, v2.version, MetricGoal::Maximize)
        .expect("operation should succeed");
    assert!(!cmp.v2_is_better);
}

#[test]
fn test_sqlite_state_survives_reopen() {
    let dir = TempDir::new().expect("temp dir should be created");
    let config = RegistryConfig::sqlite(dir.path().join("registry.db"));

    {
        let registry = Registry::open(&config).expect("operation should succeed");
        registry.register("m", "runs:/a/model").expect("operation should succeed");
        registry.set_tag("m", 1, "metric_accuracy", "0.93").expect("operation should succeed");
        registry
            .promote("m", 1, ModelStage::Production, true)
            .expect("operation should succeed");
    }

    let registry = Registry::open(&config).expect("operation should succeed");
    let latest = registry.latest("m", None).expect("operation should succeed");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].version.stage, ModelStage::Production);
    assert_eq!(latest[0].tags["metric_accuracy"], "0.93");

    let next = registry.register("m", "runs:/b/model").expect("operation should succeed");
    assert_eq!(next.version, 2);
}

#[test]
fn test_invalid_stage_name() {
    let err = "Canary".parse::<ModelStage>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidStage);
}
