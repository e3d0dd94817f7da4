//! Registry storage: backends and the model registry built on them

pub mod memory;
pub mod registry;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryBackend;
pub use registry::{ModelStage, Registry, RegistryError, Result};
pub use sqlite::SqliteBackend;
pub use traits::{LineageStore, RegistryBackend};
