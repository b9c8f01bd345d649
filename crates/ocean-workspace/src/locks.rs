//! Scoped mutual exclusion
//!
//! Block writes must be serialized per page and link check-and-insert
//! per tenant: all of them are read-compute-write sequences over
//! whole-record store writes, and interleaving them corrupts the
//! invariant they maintain (dense positions, acyclic block edges).
//! [`ScopeLocks`] hands out one async mutex per key; the registry
//! itself is guarded by a non-async `parking_lot` mutex that is never
//! held across an await.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of per-key async locks
#[derive(Default)]
pub struct ScopeLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ScopeLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for a key. Callers hold the returned
    /// mutex for the whole read-compute-write sequence, including the
    /// awaited store calls inside it.
    pub fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut inner = self.inner.lock();
        inner
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_returns_same_lock() {
        let locks = ScopeLocks::new();
        let a = locks.lock_for("page-1");
        let b = locks.lock_for("page-1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_keys_are_independent() {
        let locks = ScopeLocks::new();
        let a = locks.lock_for("page-1");
        let b = locks.lock_for("page-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn lock_serializes_critical_sections() {
        let locks = Arc::new(ScopeLocks::new());
        let counter = Arc::new(tokio::sync::Mutex::new(0usize));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let lock = locks.lock_for("shared");
                let _guard = lock.lock().await;
                let mut n = counter.lock().await;
                let seen = *n;
                tokio::task::yield_now().await;
                *n = seen + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*counter.lock().await, 8);
    }
}
