//! Metadata store: schema-less string tags per version

use std::sync::Arc;

use super::deadline::Deadline;
use super::error::{RegistryError, Result};
use super::version::Tags;
use crate::storage::traits::{LineageStore, RegistryBackend};

/// Upsert and read tags. Keys are not validated; metric names and parameter
/// sets vary per model family.
#[derive(Clone)]
pub struct MetadataStore {
    backend: Arc<dyn RegistryBackend>,
}

impl MetadataStore {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self { backend }
    }

    /// Set one tag, overwriting any previous value
    pub fn set_tag(
        &self,
        lineage: &str,
        version: u32,
        key: &str,
        value: &str,
        deadline: &Deadline,
    ) -> Result<()> {
        let mut tags = Tags::new();
        tags.insert(key.to_string(), value.to_string());
        self.bulk_set_tags(lineage, version, &tags, deadline)
    }

    /// Set a batch of tags; readers never observe part of the batch
    pub fn bulk_set_tags(
        &self,
        lineage: &str,
        version: u32,
        tags: &Tags,
        deadline: &Deadline,
    ) -> Result<()> {
        deadline.check("tag")?;
        self.backend.upsert_tags(lineage, version, tags)?;
        tracing::debug!(lineage, version, count = tags.len(), "tagged version");
        Ok(())
    }

    /// All tags of a version
    pub fn get_tags(&self, lineage: &str, version: u32) -> Result<Tags> {
        if self.backend.version(lineage, version)?.is_none() {
            return Err(RegistryError::version_not_found(lineage, version));
        }
        self.backend.tags(lineage, version)
    }
}
