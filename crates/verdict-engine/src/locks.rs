//! Per-key async mutual exclusion.

use std::{hash::Hash, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable<K> = Arc<DashMap<K, Arc<Mutex<()>>>>;

/// A table of async mutexes keyed by `K`.
///
/// An entry lives only while some task holds or waits for its lock, so the
/// table stays as small as the set of keys currently in use.
pub struct KeyedLocks<K: Eq + Hash> {
  table: LockTable<K>,
}

impl<K: Eq + Hash> Default for KeyedLocks<K> {
  fn default() -> Self { Self { table: Arc::new(DashMap::new()) } }
}

impl<K> KeyedLocks<K>
where
  K: Eq + Hash + Clone,
{
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `key`.
  pub async fn lock(&self, key: K) -> KeyGuard<K> {
    let mutex = Arc::clone(&self.table.entry(key.clone()).or_default());
    let guard = mutex.lock_owned().await;
    KeyGuard { guard: Some(guard), key, table: Arc::clone(&self.table) }
  }

  /// Number of keys currently locked or waited on.
  pub fn len(&self) -> usize { self.table.len() }

  pub fn is_empty(&self) -> bool { self.table.is_empty() }
}

/// Exclusive access to one key; released on drop.
pub struct KeyGuard<K: Eq + Hash> {
  guard: Option<OwnedMutexGuard<()>>,
  key:   K,
  table: LockTable<K>,
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
  fn drop(&mut self) {
    drop(self.guard.take());
    // Only the table's own reference left: nobody holds or awaits this lock.
    self
      .table
      .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
  }
}
