//! Per-key async mutexes.
//!
//! Each user identity, anonymous token, the admin set, and the snapshot file
//! gets its own lock, so
//! a read-modify-write on one key never interleaves with another on the same
//! key while different keys proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

use crate::identity::CallerIdentity;

const MIN_PRUNE_AT: usize = 64;

#[derive(Debug)]
struct Table {
    locks: HashMap<String, Arc<tokio::sync::Mutex<()>>>,
    prune_at: usize,
}

impl Default for Table {
    fn default() -> Self {
        Self { locks: HashMap::new(), prune_at: MIN_PRUNE_AT }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct KeyLocks {
    table: Arc<Mutex<Table>>,
}

impl KeyLocks {
    pub(crate) async fn user(&self, id: &CallerIdentity) -> OwnedMutexGuard<()> {
        self.acquire(format!("user:{id}")).await
    }

    pub(crate) async fn token(&self, token: &str) -> OwnedMutexGuard<()> {
        self.acquire(format!("token:{token}")).await
    }

    pub(crate) async fn admins(&self) -> OwnedMutexGuard<()> {
        self.acquire("admins".to_string()).await
    }

    /// Held across snapshot export and write so saves land in export order.
    pub(crate) async fn persist(&self) -> OwnedMutexGuard<()> {
        self.acquire("persist".to_string()).await
    }

    async fn acquire(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = {
            // The table holds no invariant a panic could break.
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            if table.locks.len() >= table.prune_at {
                // Only the table's own reference left means nobody holds or awaits it.
                table.locks.retain(|_, l| Arc::strong_count(l) > 1);
                table.prune_at = (table.locks.len() * 2).max(MIN_PRUNE_AT);
            }
            table.locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).locks.len()
    }
}
