//! YAML schema for registry configuration
//!
//! ```yaml
//! store:
//!   kind: sqlite
//!   path: ./registry.db
//! timeout_ms: 5000
//! archive_existing: true
//! actor: ci-pipeline
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::storage::registry::{RegistryError, Result};
use crate::storage::{MemoryBackend, RegistryBackend, SqliteBackend};

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_archive_existing() -> bool {
    true
}

/// Where registry state lives
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local, lost on exit
    #[default]
    Memory,
    /// SQLite database file
    Sqlite { path: PathBuf },
}

impl StoreConfig {
    /// Create a SQLite store configuration
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::Sqlite { path: path.into() }
    }

    /// Create a backend from this configuration
    pub fn build(&self, busy_timeout: Duration) -> Result<Arc<dyn RegistryBackend>> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryBackend::new())),
            Self::Sqlite { path } => {
                Ok(Arc::new(SqliteBackend::open_with_busy_timeout(path, busy_timeout)?))
            }
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Per-operation deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Default for the archive sweep when promoting
    #[serde(default = "default_archive_existing")]
    pub archive_existing: bool,
    /// User recorded on stage transitions
    #[serde(default)]
    pub actor: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            timeout_ms: default_timeout_ms(),
            archive_existing: default_archive_existing(),
            actor: None,
        }
    }
}

impl RegistryConfig {
    /// Configuration backed by a SQLite file, other settings default
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self { store: StoreConfig::sqlite(path), ..Self::default() }
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| RegistryError::Config(format!("Failed to parse YAML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the registry cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(RegistryError::Config("timeout_ms must be greater than zero".into()));
        }
        if let StoreConfig::Sqlite { path } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(RegistryError::Config("store.path must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Per-operation timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
