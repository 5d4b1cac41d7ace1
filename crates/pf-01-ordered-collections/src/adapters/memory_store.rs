//! In-memory Ordered Item Store
//!
//! Implements `OrderedItemStore` with per-owner optimistic versioning:
//! a transaction stages a private copy of the owner's rows and publishes it
//! on commit only if no other commit for that owner landed in between.
//!
//! Used by tests and single-process deployments. Also carries fault
//! injection and artificial latency so rollback, retry and timeout paths can
//! be exercised without a real database.

use crate::domain::entities::{ItemPage, OwnedRankedItem};
use crate::domain::errors::StoreError;
use crate::domain::invariants::check_dense_ranking;
use crate::domain::value_objects::{
    ItemId, OwnerId, PageRequest, Rank, RankDelta, RankRange, SortOrder, Timestamp,
};
use crate::ports::outbound::{OrderedItemStore, OwnerTransaction};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Store calls that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Begin,
    CountActive,
    FindActive,
    ShiftRanks,
    SetRank,
    Insert,
    Update,
    SoftDelete,
    Commit,
    Read,
}

#[derive(Clone, Copy, Debug)]
enum Fault {
    Unavailable,
    Conflict,
}

#[derive(Default)]
struct FaultPlan {
    pending: HashMap<StoreOperation, Fault>,
}

impl FaultPlan {
    fn take(&mut self, op: StoreOperation, owner_id: OwnerId) -> Result<(), StoreError> {
        match self.pending.remove(&op) {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(StoreError::Unavailable(format!(
                "injected failure on {:?}",
                op
            ))),
            Some(Fault::Conflict) => Err(StoreError::Conflict {
                owner_id,
                expected: 0,
                actual: 0,
            }),
        }
    }
}

#[derive(Default)]
struct OwnerRows {
    version: u64,
    /// Every row the owner ever had, soft-deleted ones included.
    items: HashMap<ItemId, OwnedRankedItem>,
}

#[derive(Default)]
struct StoreState {
    owners: HashMap<OwnerId, OwnerRows>,
    owner_of: HashMap<ItemId, OwnerId>,
}

impl StoreState {
    fn live_sorted(&self, owner_id: OwnerId) -> Vec<OwnedRankedItem> {
        let mut items: Vec<OwnedRankedItem> = self
            .owners
            .get(&owner_id)
            .map(|rows| {
                rows.items
                    .values()
                    .filter(|item| !item.is_deleted())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by_key(|item| item.rank);
        items
    }

    fn ownership_error(&self, owner_id: OwnerId, item_id: ItemId) -> StoreError {
        match self.owner_of.get(&item_id) {
            Some(actual) if *actual != owner_id => StoreError::OwnerMismatch { item_id, owner_id },
            _ => StoreError::NotFound { item_id },
        }
    }
}

/// In-memory `OrderedItemStore`.
#[derive(Clone, Default)]
pub struct InMemoryOrderedItemStore {
    state: Arc<RwLock<StoreState>>,
    faults: Arc<Mutex<FaultPlan>>,
    latency: Option<Duration>,
}

impl InMemoryOrderedItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every transactional call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next call of `op` with `Unavailable`.
    pub fn fail_next(&self, op: StoreOperation) {
        self.faults.lock().pending.insert(op, Fault::Unavailable);
    }

    /// Report a version conflict on the next commit.
    pub fn conflict_next_commit(&self) {
        self.faults
            .lock()
            .pending
            .insert(StoreOperation::Commit, Fault::Conflict);
    }

    /// Committed live items of `owner_id`, ordered by rank.
    pub fn live_items(&self, owner_id: OwnerId) -> Vec<OwnedRankedItem> {
        self.state.read().live_sorted(owner_id)
    }

    /// Commit counter of `owner_id`.
    pub fn version(&self, owner_id: OwnerId) -> u64 {
        self.state
            .read()
            .owners
            .get(&owner_id)
            .map(|rows| rows.version)
            .unwrap_or(0)
    }

    fn take_fault(&self, op: StoreOperation, owner_id: OwnerId) -> Result<(), StoreError> {
        self.faults.lock().take(op, owner_id)
    }
}

#[async_trait]
impl OrderedItemStore for InMemoryOrderedItemStore {
    async fn begin(&self, owner_id: OwnerId) -> Result<Box<dyn OwnerTransaction>, StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.take_fault(StoreOperation::Begin, owner_id)?;

        let (base_version, staged) = {
            let state = self.state.read();
            state
                .owners
                .get(&owner_id)
                .map(|rows| (rows.version, rows.items.clone()))
                .unwrap_or_default()
        };

        debug!(
            "[pf-01] Begin transaction for owner {} at version {}",
            owner_id, base_version
        );

        Ok(Box::new(InMemoryTransaction {
            owner_id,
            base_version,
            staged,
            inserted: Vec::new(),
            committed: false,
            store: self.clone(),
        }))
    }

    async fn find_by_owner_ordered(
        &self,
        owner_id: OwnerId,
        page: PageRequest,
        sort: SortOrder,
    ) -> Result<ItemPage, StoreError> {
        self.take_fault(StoreOperation::Read, owner_id)?;

        let mut live = self.state.read().live_sorted(owner_id);
        if sort == SortOrder::RankDescending {
            live.reverse();
        }

        let total = live.len() as Rank;
        let items = live
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .collect();

        Ok(ItemPage {
            items,
            page: page.page,
            limit: page.limit,
            sort,
            total,
        })
    }

    async fn find_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<OwnedRankedItem, StoreError> {
        self.take_fault(StoreOperation::Read, owner_id)?;

        let state = self.state.read();
        state
            .owners
            .get(&owner_id)
            .and_then(|rows| rows.items.get(&item_id))
            .filter(|item| !item.is_deleted())
            .cloned()
            .ok_or_else(|| state.ownership_error(owner_id, item_id))
    }

    async fn count_active(&self, owner_id: OwnerId) -> Result<Rank, StoreError> {
        self.take_fault(StoreOperation::Read, owner_id)?;

        Ok(self
            .state
            .read()
            .owners
            .get(&owner_id)
            .map(|rows| rows.items.values().filter(|i| !i.is_deleted()).count() as Rank)
            .unwrap_or(0))
    }
}

/// Staged unit of work over one owner's rows.
pub struct InMemoryTransaction {
    owner_id: OwnerId,
    base_version: u64,
    staged: HashMap<ItemId, OwnedRankedItem>,
    inserted: Vec<ItemId>,
    committed: bool,
    store: InMemoryOrderedItemStore,
}

impl InMemoryTransaction {
    async fn enter(&self, op: StoreOperation) -> Result<(), StoreError> {
        if let Some(latency) = self.store.latency {
            tokio::time::sleep(latency).await;
        }
        self.store.take_fault(op, self.owner_id)
    }

    fn live_mut(&mut self, item_id: ItemId) -> Result<&mut OwnedRankedItem, StoreError> {
        match self.staged.get_mut(&item_id) {
            Some(item) if !item.is_deleted() => Ok(item),
            Some(_) => Err(StoreError::NotFound { item_id }),
            None => Err(self
                .store
                .state
                .read()
                .ownership_error(self.owner_id, item_id)),
        }
    }
}

#[async_trait]
impl OwnerTransaction for InMemoryTransaction {
    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    async fn count_active(&mut self) -> Result<Rank, StoreError> {
        self.enter(StoreOperation::CountActive).await?;
        Ok(self.staged.values().filter(|i| !i.is_deleted()).count() as Rank)
    }

    async fn find_active(&mut self, item_id: ItemId) -> Result<OwnedRankedItem, StoreError> {
        self.enter(StoreOperation::FindActive).await?;
        self.live_mut(item_id).map(|item| item.clone())
    }

    async fn shift_ranks_in_range(
        &mut self,
        range: RankRange,
        delta: RankDelta,
        now: Timestamp,
    ) -> Result<u32, StoreError> {
        self.enter(StoreOperation::ShiftRanks).await?;

        let mut touched = 0;
        for item in self.staged.values_mut() {
            if item.is_deleted() || !range.contains(item.rank) {
                continue;
            }
            item.rank = delta.apply(item.rank);
            item.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn set_rank(
        &mut self,
        item_id: ItemId,
        rank: Rank,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.enter(StoreOperation::SetRank).await?;

        let item = self.live_mut(item_id)?;
        item.rank = rank;
        item.updated_at = now;
        Ok(())
    }

    async fn insert(&mut self, item: OwnedRankedItem) -> Result<(), StoreError> {
        self.enter(StoreOperation::Insert).await?;

        if item.owner_id != self.owner_id {
            return Err(StoreError::OwnerMismatch {
                item_id: item.id,
                owner_id: self.owner_id,
            });
        }
        if self.staged.contains_key(&item.id) {
            return Err(StoreError::DuplicateItem { item_id: item.id });
        }

        self.inserted.push(item.id);
        self.staged.insert(item.id, item);
        Ok(())
    }

    async fn update(&mut self, item: OwnedRankedItem) -> Result<(), StoreError> {
        self.enter(StoreOperation::Update).await?;

        let current = self.live_mut(item.id)?;
        // Rank and lifecycle fields are owned by the ranking operations.
        current.active = item.active;
        current.payload = item.payload;
        current.updated_at = item.updated_at;
        Ok(())
    }

    async fn soft_delete(&mut self, item_id: ItemId, now: Timestamp) -> Result<(), StoreError> {
        self.enter(StoreOperation::SoftDelete).await?;

        let item = self.live_mut(item_id)?;
        item.deleted_at = Some(now);
        item.updated_at = now;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.enter(StoreOperation::Commit).await?;

        let live_ranks: Vec<Rank> = self
            .staged
            .values()
            .filter(|item| !item.is_deleted())
            .map(|item| item.rank)
            .collect();
        check_dense_ranking(&live_ranks).map_err(|detail| StoreError::InvariantViolation {
            owner_id: self.owner_id,
            detail,
        })?;

        let mut state = self.store.state.write();

        let actual = state
            .owners
            .get(&self.owner_id)
            .map(|rows| rows.version)
            .unwrap_or(0);
        if actual != self.base_version {
            return Err(StoreError::Conflict {
                owner_id: self.owner_id,
                expected: self.base_version,
                actual,
            });
        }

        if let Some(item_id) = self
            .inserted
            .iter()
            .find(|id| state.owner_of.contains_key(*id))
        {
            return Err(StoreError::DuplicateItem { item_id: *item_id });
        }

        for item_id in &self.inserted {
            state.owner_of.insert(*item_id, self.owner_id);
        }

        let rows = state.owners.entry(self.owner_id).or_default();
        rows.items = std::mem::take(&mut self.staged);
        rows.version = actual + 1;
        self.committed = true;

        debug!(
            "[pf-01] Committed owner {} at version {} ({} live rows)",
            self.owner_id,
            rows.version,
            live_ranks.len()
        );
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.committed {
            debug!(
                "[pf-01] Rolled back transaction for owner {} at version {}",
                self.owner_id, self.base_version
            );
        }
    }
}
