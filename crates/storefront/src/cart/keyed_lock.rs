//! Per-key async mutual exclusion.
//!
//! The cart API has no atomic "set quantity", so an update is a DELETE
//! followed by a POST. Two updates for the same product must not interleave
//! between those two requests. Waiters for one key are served in FIFO order
//! (`tokio::sync::Mutex` is fair); distinct keys never block each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A lazily populated map of async mutexes.
///
/// Entries are removed again once nobody holds or awaits them.
#[derive(Debug)]
pub struct KeyedLock<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLock<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLock<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Cancel safe: dropping the future before it resolves still releases
    /// the key's map entry.
    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        // Declared first so it drops last, after `acquire` has released its slot.
        let mut pending = KeyedGuard {
            owner: self,
            key,
            guard: None,
        };
        let acquire = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(pending.key.clone()).or_default()).lock_owned()
        };
        pending.guard = Some(acquire.await);
        pending
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one key; released on drop.
///
/// Also stands in for a pending [`KeyedLock::lock`] call (with no guard yet),
/// so a cancelled waiter cleans up the same way a holder does.
#[derive(Debug)]
pub struct KeyedGuard<'a, K: Eq + Hash> {
    owner: &'a KeyedLock<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut slots = self
            .owner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map still references the slot: no holder, no waiter.
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let lock = Arc::new(KeyedLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let lock = Arc::clone(&lock);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            tasks.push(tokio::spawn(async move {
                let _guard = lock.lock(7).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.expect("task panicked");
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(lock.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let lock = KeyedLock::new();
        let _a = lock.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), lock.lock(2)).await;
        assert!(b.is_ok());
        assert_eq!(lock.active_keys(), 2);
    }

    #[tokio::test]
    async fn test_waiters_are_served_in_order() {
        let lock = Arc::new(KeyedLock::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = lock.lock("tea").await;
        let mut tasks = Vec::new();
        for n in 0..4 {
            let lock = Arc::clone(&lock);
            let order = Arc::clone(&order);
            tasks.push(tokio::spawn(async move {
                let _guard = lock.lock("tea").await;
                order.lock().unwrap_or_else(PoisonError::into_inner).push(n);
            }));
            // Let the task reach the mutex queue before spawning the next one.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        drop(first);
        for task in tasks {
            task.await.expect("task panicked");
        }

        let order = order.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(order, [0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_after_release_frees_key() {
        let lock = KeyedLock::new();
        let holder = lock.lock(3).await;
        let mut waiter = Box::pin(lock.lock(3));
        let timed_out = tokio::time::timeout(Duration::from_millis(10), &mut waiter).await;
        assert!(timed_out.is_err());

        // The holder sees the waiter and leaves the entry for it.
        drop(holder);
        assert_eq!(lock.active_keys(), 1);

        // The waiter gives up without ever being polled again.
        drop(waiter);
        assert_eq!(lock.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_before_release_frees_key() {
        let lock = KeyedLock::new();
        let holder = lock.lock(3).await;
        let waiter = tokio::time::timeout(Duration::from_millis(10), lock.lock(3)).await;
        assert!(waiter.is_err());
        assert_eq!(lock.active_keys(), 1);

        drop(holder);
        assert_eq!(lock.active_keys(), 0);

        // The key is usable again.
        let _again = lock.lock(3).await;
        assert_eq!(lock.active_keys(), 1);
    }
}
