//! Version, transition and tag persistence tests.

use crate::storage::registry::{ArtifactVersion, ErrorKind, ModelStage, StageTransition, Tags};
use crate::storage::sqlite::backend::SqliteBackend;
use crate::storage::traits::{LineageStore, RegistryBackend};
use tempfile::TempDir;

fn insert(backend: &SqliteBackend, lineage: &str, version: u32, source: &str) {
    backend
        .insert_version(&ArtifactVersion::new(lineage, version, source))
        .expect("insert should succeed");
}

#[test]
fn test_insert_and_get_version() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    let original = ArtifactVersion::new("forecasting", 1, "runs:/abc/model");
    backend.insert_version(&original).expect("insert should succeed");

    let loaded = backend.version("forecasting", 1).expect("query should succeed").unwrap();
    assert_eq!(loaded.source_ref, "runs:/abc/model");
    assert_eq!(loaded.stage, ModelStage::None);
    assert_eq!(loaded.created_at.timestamp_micros(), original.created_at.timestamp_micros());
}

#[test]
fn test_versions_ordered_by_id() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    for id in [2, 10, 1] {
        insert(&backend, "m", id, &format!("r{id}"));
    }
    let ids: Vec<_> =
        backend.versions("m").expect("query should succeed").iter().map(|v| v.version).collect();
    assert_eq!(ids, vec![1, 2, 10]);
}

#[test]
fn test_duplicate_source_reports_existing_version() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    insert(&backend, "m", 1, "runs:/abc/model");

    let err = backend
        .insert_version(&ArtifactVersion::new("m", 2, "runs:/abc/model"))
        .expect_err("duplicate must fail");
    assert_eq!(err.kind(), ErrorKind::DuplicateSourceRef);
    assert!(err.to_string().contains("v1"));
    assert_eq!(backend.versions("m").expect("query should succeed").len(), 1);
}

#[test]
fn test_same_source_in_other_lineage_is_allowed() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    insert(&backend, "a", 1, "runs:/abc/model");
    insert(&backend, "b", 1, "runs:/abc/model");
    assert_eq!(backend.lineages().expect("query should succeed"), vec!["a", "b"]);
}

#[test]
fn test_apply_transition_is_atomic_with_history() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    insert(&backend, "m", 1, "r1");

    let transition = StageTransition::new("m", 1, ModelStage::None, ModelStage::Production)
        .with_user(Some("alice"))
        .with_reason(Some("release"));
    backend.apply_transition(&transition).expect("transition should succeed");

    let version = backend.version("m", 1).expect("query should succeed").unwrap();
    assert_eq!(version.stage, ModelStage::Production);

    let history = backend.transitions("m").expect("query should succeed");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_stage, ModelStage::Production);
    assert_eq!(history[0].user.as_deref(), Some("alice"));
    assert_eq!(history[0].reason.as_deref(), Some("release"));
}

#[test]
fn test_apply_transition_unknown_version() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    let transition = StageTransition::new("m", 4, ModelStage::None, ModelStage::Staging);
    let err = backend.apply_transition(&transition).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(backend.transitions("m").expect("query should succeed").is_empty());
}

#[test]
fn test_tags_upsert_last_write_wins() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    insert(&backend, "m", 1, "r1");

    let mut tags = Tags::new();
    tags.insert("metric_mape".into(), "0.15".into());
    tags.insert("model_type".into(), "forecasting".into());
    backend.upsert_tags("m", 1, &tags).expect("upsert should succeed");

    let mut correction = Tags::new();
    correction.insert("metric_mape".into(), "0.12".into());
    backend.upsert_tags("m", 1, &correction).expect("upsert should succeed");

    let stored = backend.tags("m", 1).expect("query should succeed");
    assert_eq!(stored.get("metric_mape").map(String::as_str), Some("0.12"));
    assert_eq!(stored.get("model_type").map(String::as_str), Some("forecasting"));
}

#[test]
fn test_tags_for_missing_version_rejected() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");
    let mut tags = Tags::new();
    tags.insert("k".into(), "v".into());
    let err = backend.upsert_tags("m", 1, &tags).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("registry.db");
    {
        let backend = SqliteBackend::open(&path).expect("open should succeed");
        insert(&backend, "m", 1, "r1");
        backend
            .apply_transition(&StageTransition::new("m", 1, ModelStage::None, ModelStage::Staging))
            .expect("transition should succeed");
    }

    let backend = SqliteBackend::open(&path).expect("reopen should succeed");
    let version = backend.version("m", 1).expect("query should succeed").unwrap();
    assert_eq!(version.stage, ModelStage::Staging);
    assert_eq!(backend.transitions("m").expect("query should succeed").len(), 1);
}
