//! Per-lineage exclusive sections within one process
//!
//! Registration and stage transitions on one lineage read-then-write catalog
//! state, so they run one at a time. Different lineages never contend.
//! Backends layer their own cross-process locking on top of this.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use super::deadline::Deadline;
use super::error::{RegistryError, Result};

#[derive(Debug, Default)]
struct LineageLock {
    held: Mutex<bool>,
    released: Condvar,
}

/// Table of lineage locks. An entry exists only while some caller holds
/// or waits for that lineage.
#[derive(Debug, Default)]
pub struct LineageLocks {
    locks: Arc<Mutex<HashMap<String, Arc<LineageLock>>>>,
}

/// Releases the lineage section on drop
#[derive(Debug)]
pub struct LineageGuard {
    lock: Arc<LineageLock>,
    table: Arc<Mutex<HashMap<String, Arc<LineageLock>>>>,
    lineage: String,
}

impl LineageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the exclusive section for `lineage`, waiting at most until `deadline`
    pub fn acquire(
        &self,
        lineage: &str,
        deadline: &Deadline,
        operation: &'static str,
    ) -> Result<LineageGuard> {
        let lock = self.lock_for(lineage)?;

        let entered = Self::wait_for(&lock, lineage, deadline, operation);
        if entered.is_err() {
            prune(&self.locks, lineage, &lock);
        }
        entered?;

        Ok(LineageGuard {
            lock,
            table: Arc::clone(&self.locks),
            lineage: lineage.to_string(),
        })
    }

    /// Number of lineages currently held or waited on
    pub fn active(&self) -> usize {
        self.locks.lock().map_or(0, |locks| locks.len())
    }

    fn wait_for(
        lock: &LineageLock,
        lineage: &str,
        deadline: &Deadline,
        operation: &'static str,
    ) -> Result<()> {
        let mut held = recover(lock.held.lock())?;
        while *held {
            tracing::debug!(lineage, operation, "waiting for lineage lock");
            held = match deadline.remaining() {
                None => recover(lock.released.wait(held))?,
                Some(left) if left.is_zero() => return Err(deadline.timeout_error(operation)),
                Some(left) => {
                    let (guard, _) = lock
                        .released
                        .wait_timeout(held, left)
                        .map_err(|e| RegistryError::Storage(format!("Lineage lock poisoned: {e}")))?;
                    guard
                }
            };
        }
        *held = true;
        Ok(())
    }

    fn lock_for(&self, lineage: &str) -> Result<Arc<LineageLock>> {
        let mut locks = recover(self.locks.lock())?;
        Ok(Arc::clone(locks.entry(lineage.to_string()).or_default()))
    }
}

impl LineageGuard {
    pub fn lineage(&self) -> &str {
        &self.lineage
    }
}

impl Drop for LineageGuard {
    fn drop(&mut self) {
        // A poisoned flag still has to be cleared or the lineage is wedged
        let mut held = match self.lock.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *held = false;
        drop(held);
        self.lock.released.notify_one();
        prune(&self.table, &self.lineage, &self.lock);
    }
}

/// Drop the table entry for `lineage` once no guard or waiter refers to it.
/// Callers clone entries only under the table lock, so the count is stable
/// while it is held.
fn prune(table: &Mutex<HashMap<String, Arc<LineageLock>>>, lineage: &str, lock: &Arc<LineageLock>) {
    let mut locks = match table.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let idle = locks
        .get(lineage)
        .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(entry) == 2);
    if idle {
        locks.remove(lineage);
    }
}

fn recover<T>(result: std::sync::LockResult<T>) -> Result<T> {
    result.map_err(|e| RegistryError::Storage(format!("Lineage lock poisoned: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::registry::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_release() {
        let locks = LineageLocks::new();
        let guard = locks.acquire("m", &Deadline::never(), "test").unwrap();
        assert_eq!(guard.lineage(), "m");
        drop(guard);
        assert!(locks.acquire("m", &Deadline::never(), "test").is_ok());
    }

    #[test]
    fn test_held_lock_times_out() {
        let locks = LineageLocks::new();
        let _guard = locks.acquire("m", &Deadline::never(), "test").unwrap();

        let err = locks
            .acquire("m", &Deadline::after(Duration::from_millis(20)), "promote")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_lineages_are_independent() {
        let locks = LineageLocks::new();
        let _a = locks.acquire("a", &Deadline::never(), "test").unwrap();
        assert!(locks.acquire("b", &Deadline::after(Duration::from_millis(20)), "test").is_ok());
    }

    #[test]
    fn test_table_shrinks_after_release() {
        let locks = LineageLocks::new();
        let a = locks.acquire("a", &Deadline::never(), "test").unwrap();
        let b = locks.acquire("b", &Deadline::never(), "test").unwrap();
        assert_eq!(locks.active(), 2);

        drop(a);
        assert_eq!(locks.active(), 1);
        drop(b);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn test_timed_out_waiter_leaves_entry_to_holder() {
        let locks = LineageLocks::new();
        let guard = locks.acquire("m", &Deadline::never(), "test").unwrap();
        assert!(locks.acquire("m", &Deadline::after(Duration::from_millis(10)), "test").is_err());
        assert_eq!(locks.active(), 1);

        drop(guard);
        assert_eq!(locks.active(), 0);
        assert!(locks.acquire("m", &Deadline::never(), "test").is_ok());
    }

    #[test]
    fn test_mutual_exclusion() {
        let locks = Arc::new(LineageLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _guard = locks.acquire("m", &Deadline::never(), "test").unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread join should succeed");
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
