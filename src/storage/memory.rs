//! In-memory registry backend

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::storage::registry::{
    ArtifactVersion, Deadline, LineageLocks, RegistryError, Result, StageTransition, Tags,
};
use crate::storage::traits::{LineageStore, RegistryBackend};

#[derive(Debug, Default)]
struct MemoryState {
    /// lineage -> version -> record
    versions: BTreeMap<String, BTreeMap<u32, ArtifactVersion>>,
    /// (lineage, version) -> tags
    tags: HashMap<(String, u32), Tags>,
    transitions: Vec<StageTransition>,
}

/// In-memory backend for tests and short-lived processes.
///
/// Writes inside an exclusive section apply one by one; there is no
/// rollback.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    sections: LineageLocks,
}

impl MemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| RegistryError::Storage(format!("Failed to acquire read lock: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| RegistryError::Storage(format!("Failed to acquire write lock: {e}")))
    }
}

impl LineageStore for MemoryBackend {
    fn versions(&self, lineage: &str) -> Result<Vec<ArtifactVersion>> {
        Ok(self
            .read()?
            .versions
            .get(lineage)
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default())
    }

    fn version(&self, lineage: &str, version: u32) -> Result<Option<ArtifactVersion>> {
        Ok(self.read()?.versions.get(lineage).and_then(|v| v.get(&version)).cloned())
    }

    fn insert_version(&self, version: &ArtifactVersion) -> Result<()> {
        let mut state = self.write()?;
        let versions = state.versions.entry(version.lineage.clone()).or_default();

        if let Some(existing) = versions.values().find(|v| v.source_ref == version.source_ref) {
            return Err(RegistryError::DuplicateSourceRef {
                lineage: version.lineage.clone(),
                source_ref: version.source_ref.clone(),
                existing: existing.version,
            });
        }
        if versions.contains_key(&version.version) {
            return Err(RegistryError::Storage(format!(
                "Version id {} already allocated for {}",
                version.version, version.lineage
            )));
        }

        versions.insert(version.version, version.clone());
        Ok(())
    }

    fn apply_transition(&self, transition: &StageTransition) -> Result<()> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        let record = state
            .versions
            .get_mut(&transition.lineage)
            .and_then(|versions| versions.get_mut(&transition.version))
            .ok_or_else(|| {
                RegistryError::version_not_found(&transition.lineage, transition.version)
            })?;

        record.stage = transition.to_stage;
        state.transitions.push(transition.clone());
        Ok(())
    }

}

impl RegistryBackend for MemoryBackend {
    fn exclusive(
        &self,
        lineage: &str,
        deadline: &Deadline,
        work: &mut dyn FnMut(&dyn LineageStore) -> Result<()>,
    ) -> Result<()> {
        let _section = self.sections.acquire(lineage, deadline, "lineage section")?;
        work(self)
    }

    fn lineages(&self) -> Result<Vec<String>> {
        Ok(self.read()?.versions.keys().cloned().collect())
    }

    fn transitions(&self, lineage: &str) -> Result<Vec<StageTransition>> {
        Ok(self.read()?.transitions.iter().filter(|t| t.lineage == lineage).cloned().collect())
    }

    fn upsert_tags(&self, lineage: &str, version: u32, tags: &Tags) -> Result<()> {
        let mut state = self.write()?;
        let exists = state.versions.get(lineage).is_some_and(|v| v.contains_key(&version));
        if !exists {
            return Err(RegistryError::version_not_found(lineage, version));
        }

        let stored = state.tags.entry((lineage.to_string(), version)).or_default();
        for (key, value) in tags {
            stored.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn tags(&self, lineage: &str, version: u32) -> Result<Tags> {
        Ok(self.read()?.tags.get(&(lineage.to_string(), version)).cloned().unwrap_or_default())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
