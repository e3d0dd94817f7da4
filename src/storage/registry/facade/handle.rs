//! Registry handle and its construction

use std::sync::Arc;
use std::time::Duration;

use super::super::catalog::VersionCatalog;
use super::super::deadline::Deadline;
use super::super::error::Result;
use super::super::tags::MetadataStore;
use super::super::transitioner::StageTransitioner;
use crate::config::RegistryConfig;
use crate::storage::memory::MemoryBackend;
use crate::storage::traits::RegistryBackend;

/// Model registry handle.
///
/// Cheap to clone; clones share the backend, so they can be handed to as
/// many threads as needed. Separate handles on one store, in this process or
/// another, are serialized per lineage by the backend.
#[derive(Clone)]
pub struct Registry {
    pub(crate) backend: Arc<dyn RegistryBackend>,
    pub(crate) catalog: Arc<VersionCatalog>,
    pub(crate) metadata: MetadataStore,
    pub(crate) transitioner: StageTransitioner,
    pub(crate) timeout: Option<Duration>,
    pub(crate) actor: Option<String>,
    pub(crate) archive_existing: bool,
}

impl Registry {
    /// Build a registry over an existing backend
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        let catalog = Arc::new(VersionCatalog::new(Arc::clone(&backend)));
        Self {
            metadata: MetadataStore::new(Arc::clone(&backend)),
            transitioner: StageTransitioner::new(Arc::clone(&catalog)),
            catalog,
            backend,
            timeout: None,
            actor: None,
            archive_existing: true,
        }
    }

    /// Registry over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open the store named by `config` and apply its defaults
    pub fn open(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        let backend = config.store.build(config.timeout())?;
        tracing::info!(backend = backend.backend_type(), "opened model registry");

        let mut registry = Self::new(backend).with_timeout(config.timeout());
        registry.archive_existing = config.archive_existing;
        registry.actor = config.actor.clone();
        Ok(registry)
    }

    /// Same registry state, with every call bounded by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Same registry state, recording `actor` on stage transitions
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    /// Default used by [`Registry::transition`]
    pub fn archive_existing(&self) -> bool {
        self.archive_existing
    }

    /// Get backend type name
    pub fn backend_type(&self) -> &'static str {
        self.backend.backend_type()
    }

    pub(crate) fn deadline(&self) -> Deadline {
        self.timeout.map_or_else(Deadline::never, Deadline::after)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("backend", &self.backend.backend_type())
            .field("timeout", &self.timeout)
            .field("actor", &self.actor)
            .field("archive_existing", &self.archive_existing)
            .finish()
    }
}
