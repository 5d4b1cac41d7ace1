//! Owner-scoped mutation locks
//!
//! One async mutex per owner with a mutation in flight. Mutations of
//! different owners never contend; mutations of the same owner run one at a
//! time for their whole read-plan-apply-commit sequence.
//!
//! Entries are created on demand and removed when the last holder releases,
//! so the table only ever holds owners that are currently being mutated (or
//! waited on).

use crate::domain::value_objects::OwnerId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of per-owner locks.
#[derive(Default)]
pub struct OwnerLockTable {
    locks: Mutex<HashMap<OwnerId, Arc<AsyncMutex<()>>>>,
}

impl OwnerLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `owner_id`.
    ///
    /// Cancel-safe: dropping the returned future before it resolves leaves
    /// no lock held.
    pub async fn acquire(&self, owner_id: OwnerId) -> OwnerLockGuard<'_> {
        let lock = self.locks.lock().entry(owner_id).or_default().clone();
        let guard = lock.clone().lock_owned().await;

        OwnerLockGuard {
            table: self,
            owner_id,
            lock,
            guard: Some(guard),
        }
    }

    /// Owners with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Exclusive access to one owner; released on drop.
pub struct OwnerLockGuard<'a> {
    table: &'a OwnerLockTable,
    owner_id: OwnerId,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OwnerLockGuard<'_> {
    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

impl Drop for OwnerLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.table.locks.lock();
        let idle = locks
            .get(&self.owner_id)
            .map(|entry| Arc::ptr_eq(entry, &self.lock) && Arc::strong_count(&self.lock) == 2)
            .unwrap_or(false);
        // Table + this guard: nobody else holds or waits on the lock.
        if idle {
            locks.remove(&self.owner_id);
        }
    }
}
