//! Reorder Coordinator
//!
//! Main service implementing `OrderedCollectionApi`.
//!
//! Every mutation runs the same pipeline:
//! 1. Acquire the owner lock
//! 2. Open a store transaction and read the current rank(s)
//! 3. Compute the shift plan
//! 4. Apply the shift and the subject row write, then commit
//! 5. Invalidate the affected cache scopes
//! 6. Release the lock
//!
//! Steps 1-4 are bounded by the configured store timeout. A version conflict
//! at commit restarts the pipeline from step 1, a bounded number of times.

use super::cache_guard::CacheConsistencyGuard;
use super::cache_keys::{CacheKey, CacheScope};
use super::owner_locks::{OwnerLockGuard, OwnerLockTable};
use crate::adapters::{InMemoryOrderedItemStore, LruCacheBackend, SystemTimeSource};
use crate::algorithms::{plan_delete_and_compact, plan_insert_at_top, plan_move};
use crate::config::CollectionConfig;
use crate::domain::entities::{ItemPage, ItemPatch, ListQuery, NewItem, OwnedRankedItem};
use crate::domain::errors::{CollectionError, ConfigError};
use crate::domain::value_objects::{
    CollectionKind, ItemId, OwnerId, PageRequest, Rank, ShiftPlan, Timestamp,
};
use crate::ports::inbound::OrderedCollectionApi;
use crate::ports::outbound::{OrderedItemStore, OwnerTransaction, TimeSource};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Coordinates rank-preserving mutations for one collection kind.
pub struct ReorderCoordinator {
    kind: CollectionKind,
    store: Arc<dyn OrderedItemStore>,
    cache: CacheConsistencyGuard,
    clock: Arc<dyn TimeSource>,
    locks: OwnerLockTable,
    config: CollectionConfig,
}

impl ReorderCoordinator {
    /// Create a coordinator over explicit collaborators.
    pub fn new(
        kind: CollectionKind,
        store: Arc<dyn OrderedItemStore>,
        cache: CacheConsistencyGuard,
        clock: Arc<dyn TimeSource>,
        config: CollectionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(kind, store, cache, clock, config))
    }

    /// Coordinator over an in-memory store and LRU cache, default settings.
    pub fn in_memory(kind: CollectionKind, store: InMemoryOrderedItemStore) -> Self {
        Self::assemble(
            kind,
            Arc::new(store),
            CacheConsistencyGuard::new(Arc::new(LruCacheBackend::new())),
            Arc::new(SystemTimeSource),
            CollectionConfig::default(),
        )
    }

    pub fn with_config(mut self, config: CollectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    fn assemble(
        kind: CollectionKind,
        store: Arc<dyn OrderedItemStore>,
        cache: CacheConsistencyGuard,
        clock: Arc<dyn TimeSource>,
        config: CollectionConfig,
    ) -> Self {
        Self {
            kind,
            store,
            cache,
            clock,
            locks: OwnerLockTable::new(),
            config,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheConsistencyGuard {
        &self.cache
    }

    /// Owners with a mutation in flight or queued.
    pub fn owners_locked(&self) -> usize {
        self.locks.len()
    }

    fn owner_scope(&self, owner_id: OwnerId) -> CacheScope {
        CacheScope::owner(self.kind, owner_id)
    }

    fn item_scope(&self, item_id: ItemId) -> CacheScope {
        CacheScope::item(self.kind, item_id)
    }

    /// Bound `fut` by the store timeout.
    async fn timed<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T, CollectionError>
    where
        Fut: Future<Output = Result<T, CollectionError>>,
    {
        match tokio::time::timeout(self.config.store_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.config.store_timeout_ms,
                    "Store timeout, unit of work rolled back"
                );
                Err(CollectionError::Timeout {
                    operation,
                    timeout_ms: self.config.store_timeout_ms,
                })
            }
        }
    }

    async fn lock_owner(
        &self,
        operation: &'static str,
        owner_id: OwnerId,
    ) -> Result<OwnerLockGuard<'_>, CollectionError> {
        self.timed(operation, async { Ok(self.locks.acquire(owner_id).await) })
            .await
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error, or
    /// runs out of conflict retries.
    async fn with_conflict_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        owner_id: OwnerId,
        mut attempt: F,
    ) -> Result<T, CollectionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollectionError>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && retries < self.config.max_conflict_retries => {
                    retries += 1;
                    warn!(
                        operation,
                        %owner_id,
                        retries,
                        "Concurrent modification, retrying with fresh state"
                    );
                    tokio::time::sleep(self.config.retry_backoff(retries)).await;
                }
                result => return result,
            }
        }
    }

    async fn apply_shift(
        tx: &mut Box<dyn OwnerTransaction>,
        plan: &ShiftPlan,
        now: Timestamp,
    ) -> Result<u32, CollectionError> {
        match plan.shift {
            Some(shift) => Ok(tx
                .shift_ranks_in_range(shift.range, shift.delta, now)
                .await?),
            None => Ok(0),
        }
    }

    async fn try_create(
        &self,
        owner_id: OwnerId,
        new_item: &NewItem,
    ) -> Result<OwnedRankedItem, CollectionError> {
        let _lock = self.lock_owner("create", owner_id).await?;

        let created = self
            .timed("create", async {
                let mut tx = self.store.begin(owner_id).await?;
                let current_max = tx.count_active().await?;
                let plan = plan_insert_at_top(current_max);
                let now = self.clock.now();

                let shifted = Self::apply_shift(&mut tx, &plan, now).await?;
                let mut item = new_item.clone().into_item(owner_id, now);
                item.rank = plan.target_rank.unwrap_or(1);
                tx.insert(item.clone()).await?;
                tx.commit().await?;

                debug!(%owner_id, current_max, shifted, "Insert-at-top committed");
                Ok(item)
            })
            .await?;

        // Invalidation is scheduled in the same poll that saw the commit.
        self.cache.invalidate(&[self.owner_scope(owner_id)]).await;
        Ok(created)
    }

    async fn try_delete(&self, owner_id: OwnerId, item_id: ItemId) -> Result<Rank, CollectionError> {
        let _lock = self.lock_owner("delete", owner_id).await?;

        let deleted_rank = self
            .timed("delete", async {
                let mut tx = self.store.begin(owner_id).await?;
                let item = tx.find_active(item_id).await?;
                let current_max = tx.count_active().await?;
                let plan = plan_delete_and_compact(item.rank, current_max)?;
                let now = self.clock.now();

                let shifted = Self::apply_shift(&mut tx, &plan, now).await?;
                tx.soft_delete(item_id, now).await?;
                tx.commit().await?;

                debug!(%owner_id, %item_id, rank = item.rank, shifted, "Delete-and-compact committed");
                Ok(item.rank)
            })
            .await?;

        self.cache
            .invalidate(&[self.owner_scope(owner_id), self.item_scope(item_id)])
            .await;
        Ok(deleted_rank)
    }

    async fn try_move(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        new_rank: Rank,
    ) -> Result<(OwnedRankedItem, bool), CollectionError> {
        let _lock = self.lock_owner("move", owner_id).await?;

        let (moved, changed) = self
            .timed("move", async {
                let mut tx = self.store.begin(owner_id).await?;
                let mut item = tx.find_active(item_id).await?;
                let current_max = tx.count_active().await?;
                let plan = plan_move(item.rank, new_rank, current_max)?;

                if plan.is_noop() {
                    return Ok((item, false));
                }

                let now = self.clock.now();
                let shifted = Self::apply_shift(&mut tx, &plan, now).await?;
                let target = plan.target_rank.unwrap_or(new_rank);
                tx.set_rank(item_id, target, now).await?;
                tx.commit().await?;

                debug!(
                    %owner_id,
                    %item_id,
                    from = item.rank,
                    to = target,
                    shifted,
                    "Move committed"
                );
                item.rank = target;
                item.updated_at = now;
                Ok((item, true))
            })
            .await?;

        if changed {
            self.cache
                .invalidate(&[self.owner_scope(owner_id), self.item_scope(item_id)])
                .await;
        }
        Ok((moved, changed))
    }

    async fn try_update(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        patch: &ItemPatch,
    ) -> Result<OwnedRankedItem, CollectionError> {
        let _lock = self.lock_owner("update", owner_id).await?;

        let updated = self
            .timed("update", async {
                let mut tx = self.store.begin(owner_id).await?;
                let mut item = tx.find_active(item_id).await?;
                patch.clone().apply(&mut item, self.clock.now());
                tx.update(item.clone()).await?;
                tx.commit().await?;
                Ok(item)
            })
            .await?;

        self.cache
            .invalidate(&[self.owner_scope(owner_id), self.item_scope(item_id)])
            .await;
        Ok(updated)
    }

    fn resolve_page(&self, query: &ListQuery) -> Result<PageRequest, CollectionError> {
        let page = query.page.unwrap_or(1);
        let limit = query
            .limit
            .unwrap_or(self.config.default_page_size)
            .min(self.config.max_page_size);

        if page == 0 || limit == 0 {
            return Err(CollectionError::InvalidPage { page, limit });
        }
        Ok(PageRequest::new(page, limit))
    }
}

#[async_trait]
impl OrderedCollectionApi for ReorderCoordinator {
    #[instrument(skip(self, item), fields(kind = %self.kind))]
    async fn create(
        &self,
        owner_id: OwnerId,
        item: NewItem,
    ) -> Result<OwnedRankedItem, CollectionError> {
        let created = self
            .with_conflict_retry("create", owner_id, || self.try_create(owner_id, &item))
            .await?;

        info!(%owner_id, item_id = %created.id, "Item created at rank 1");
        Ok(created)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn delete(&self, owner_id: OwnerId, item_id: ItemId) -> Result<(), CollectionError> {
        let rank = self
            .with_conflict_retry("delete", owner_id, || self.try_delete(owner_id, item_id))
            .await?;

        info!(%owner_id, %item_id, rank, "Item deleted, ranks compacted");
        Ok(())
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn move_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        new_rank: Rank,
    ) -> Result<OwnedRankedItem, CollectionError> {
        let (moved, changed) = self
            .with_conflict_retry("move", owner_id, || {
                self.try_move(owner_id, item_id, new_rank)
            })
            .await?;

        if changed {
            info!(%owner_id, %item_id, rank = moved.rank, "Item moved");
        } else {
            debug!(%owner_id, %item_id, rank = moved.rank, "Move to current rank, nothing to do");
        }
        Ok(moved)
    }

    #[instrument(skip(self, patch), fields(kind = %self.kind))]
    async fn update(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> Result<OwnedRankedItem, CollectionError> {
        if patch.is_empty() {
            return Err(CollectionError::EmptyPatch);
        }

        let updated = self
            .with_conflict_retry("update", owner_id, || {
                self.try_update(owner_id, item_id, &patch)
            })
            .await?;

        info!(%owner_id, %item_id, "Item updated");
        Ok(updated)
    }

    async fn get_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<OwnedRankedItem, CollectionError> {
        let key = CacheKey::item(self.kind, owner_id, item_id);
        let item: OwnedRankedItem = self
            .cache
            .get_or_set(&key, self.config.item_cache_ttl(), || {
                self.timed("get_item", async {
                    Ok(self.store.find_item(owner_id, item_id).await?)
                })
            })
            .await?;

        if item.owner_id != owner_id {
            return Err(CollectionError::OwnerMismatch { item_id, owner_id });
        }
        Ok(item)
    }

    async fn list(
        &self,
        owner_id: OwnerId,
        query: ListQuery,
    ) -> Result<ItemPage, CollectionError> {
        let page = self.resolve_page(&query)?;
        let key = CacheKey::listing(self.kind, owner_id, page, query.sort);

        self.cache
            .get_or_set(&key, self.config.listing_cache_ttl(), || {
                self.timed("list", async {
                    Ok(self
                        .store
                        .find_by_owner_ordered(owner_id, page, query.sort)
                        .await?)
                })
            })
            .await
    }
}
