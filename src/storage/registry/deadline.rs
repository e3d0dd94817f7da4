//! Per-call deadlines

use std::time::{Duration, Instant};

use super::error::{RegistryError, Result};

/// Point in time after which an operation must give up
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
    timeout: Duration,
}

impl Deadline {
    /// Expire `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self { expires_at: Instant::now().checked_add(timeout), timeout }
    }

    /// Never expires
    pub fn never() -> Self {
        Self { expires_at: None, timeout: Duration::MAX }
    }

    /// Time left, or `None` for an unbounded deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Fail with `Timeout` if the deadline has passed
    pub fn check(&self, operation: &'static str) -> Result<()> {
        if self.is_expired() {
            return Err(self.timeout_error(operation));
        }
        Ok(())
    }

    pub(crate) fn timeout_error(&self, operation: &'static str) -> RegistryError {
        RegistryError::Timeout { operation, timeout: self.timeout }
    }
}
