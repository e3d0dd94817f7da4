//! Thread safety tests.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::storage::registry::{ArtifactVersion, Deadline, ErrorKind, RegistryError, Tags};
use crate::storage::sqlite::backend::SqliteBackend;
use crate::storage::traits::{LineageStore, RegistryBackend};
use rusqlite::Connection;
use tempfile::TempDir;

/// Second connection that holds the database write lock until dropped
fn hold_write_lock(path: &std::path::Path) -> Connection {
    let conn = Connection::open(path).expect("open should succeed");
    conn.execute_batch("BEGIN IMMEDIATE").expect("begin should succeed");
    conn
}

#[test]
fn test_concurrent_tag_batches() {
    let backend = Arc::new(SqliteBackend::open_in_memory().expect("operation should succeed"));
    backend
        .insert_version(&ArtifactVersion::new("m", 1, "r1"))
        .expect("insert should succeed");

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let backend = Arc::clone(&backend);
            thread::spawn(move || {
                let mut tags = Tags::new();
                tags.insert(format!("metric_{i}"), format!("{}", i as f64 * 0.1));
                backend.upsert_tags("m", 1, &tags).expect("upsert should succeed");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread join should succeed");
    }

    let tags = backend.tags("m", 1).expect("query should succeed");
    assert_eq!(tags.len(), 10);
}

#[test]
fn test_exclusive_rolls_back_on_error() {
    let backend = SqliteBackend::open_in_memory().expect("operation should succeed");

    let result = backend.exclusive("m", &Deadline::never(), &mut |store: &dyn LineageStore| {
        store.insert_version(&ArtifactVersion::new("m", 1, "r1"))?;
        Err(RegistryError::Storage("injected".to_string()))
    });

    assert!(result.is_err());
    assert!(backend.versions("m").expect("query should succeed").is_empty());
}

#[test]
fn test_exclusive_times_out_behind_other_connection() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("registry.db");
    let backend = SqliteBackend::open(&path).expect("operation should succeed");
    let _holder = hold_write_lock(&path);

    let mut ran = false;
    let err = backend
        .exclusive("m", &Deadline::after(Duration::from_millis(100)), &mut |_: &dyn LineageStore| {
            ran = true;
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_retryable());
    assert!(!ran);
}

#[test]
fn test_standalone_write_times_out_behind_other_connection() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("registry.db");
    let backend = SqliteBackend::open_with_busy_timeout(&path, Duration::from_millis(100))
        .expect("operation should succeed");
    let holder = hold_write_lock(&path);

    let err = backend.insert_version(&ArtifactVersion::new("m", 1, "r1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);

    drop(holder);
    backend
        .insert_version(&ArtifactVersion::new("m", 1, "r1"))
        .expect("insert should succeed once the lock is released");
}

#[test]
fn test_sections_on_two_handles_do_not_interleave() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("registry.db");
    let first = Arc::new(SqliteBackend::open(&path).expect("operation should succeed"));
    let second = Arc::new(SqliteBackend::open(&path).expect("operation should succeed"));

    let handles: Vec<_> = (0..20)
        .map(|n| {
            let backend = if n % 2 == 0 { Arc::clone(&first) } else { Arc::clone(&second) };
            thread::spawn(move || {
                backend
                    .exclusive("m", &Deadline::never(), &mut |store: &dyn LineageStore| {
                        let next = store.versions("m")?.len() as u32 + 1;
                        thread::sleep(Duration::from_millis(1));
                        store.insert_version(&ArtifactVersion::new("m", next, &format!("r{n}")))
                    })
                    .expect("section should succeed");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread join should succeed");
    }

    let ids: Vec<u32> = SqliteBackend::open(&path)
        .expect("operation should succeed")
        .versions("m")
        .expect("query should succeed")
        .into_iter()
        .map(|v| v.version)
        .collect();
    assert_eq!(ids, (1..=20).collect::<Vec<_>>());
}
