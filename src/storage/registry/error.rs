//! Registry error types

use std::time::Duration;

use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Lineage not found: {0}")]
    LineageNotFound(String),

    #[error("Version not found: {0} v{1}")]
    VersionNotFound(String, u32),

    #[error("Source reference '{source_ref}' is already registered for {lineage} as v{existing}")]
    DuplicateSourceRef { lineage: String, source_ref: String, existing: u32 },

    #[error("Invalid stage: {0} (expected one of None, Staging, Production, Archived)")]
    InvalidStage(String),

    #[error("Archive sweep for {lineage} v{version} did not complete; target left unpromoted: {source}")]
    PartialTransitionFailure {
        lineage: String,
        version: u32,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("Operation '{operation}' exceeded its deadline of {timeout:?}")]
    Timeout { operation: &'static str, timeout: Duration },

    #[error("{lineage} v{version} was registered but tagging failed (retry tagging, not registration): {source}")]
    PartiallyRegistered {
        lineage: String,
        version: u32,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    DuplicateSourceRef,
    InvalidStage,
    PartialTransitionFailure,
    Timeout,
    PartiallyRegistered,
    Storage,
    Config,
}

impl RegistryError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LineageNotFound(_) | Self::VersionNotFound(_, _) => ErrorKind::NotFound,
            Self::DuplicateSourceRef { .. } => ErrorKind::DuplicateSourceRef,
            Self::InvalidStage(_) => ErrorKind::InvalidStage,
            Self::PartialTransitionFailure { .. } => ErrorKind::PartialTransitionFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::PartiallyRegistered { .. } => ErrorKind::PartiallyRegistered,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether retrying the same transition call is safe and may succeed.
    ///
    /// Transitions are idempotent, so a timed-out or half-swept transition
    /// can simply be issued again.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::PartialTransitionFailure)
    }

    pub(crate) fn version_not_found(lineage: &str, version: u32) -> Self {
        Self::VersionNotFound(lineage.to_string(), version)
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
