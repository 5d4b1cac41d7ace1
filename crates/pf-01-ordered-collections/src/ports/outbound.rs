//! Outbound Ports (Driven Ports / SPI)
//!
//! What the coordinator needs from persistence, caching and the clock. Any
//! relational, document or in-memory backend can implement the store port as
//! long as its transactions give atomic range shifts.

use crate::domain::entities::{ItemPage, OwnedRankedItem};
use crate::domain::errors::{CacheError, StoreError};
use crate::domain::value_objects::{
    ItemId, OwnerId, PageRequest, Rank, RankDelta, RankRange, SortOrder, Timestamp,
};
use async_trait::async_trait;
use std::time::Duration;

/// Persistence of ranked items.
///
/// Mutations go through [`OwnerTransaction`]s opened with [`begin`]. Reads
/// are served directly and only ever see committed state.
///
/// [`begin`]: OrderedItemStore::begin
#[async_trait]
pub trait OrderedItemStore: Send + Sync {
    /// Open a unit of work scoped to one owner.
    async fn begin(&self, owner_id: OwnerId) -> Result<Box<dyn OwnerTransaction>, StoreError>;

    /// Live items of `owner_id`, ordered by rank, one page at a time.
    async fn find_by_owner_ordered(
        &self,
        owner_id: OwnerId,
        page: PageRequest,
        sort: SortOrder,
    ) -> Result<ItemPage, StoreError>;

    /// A single live item.
    ///
    /// Soft-deleted and unknown ids both report `NotFound`; an item owned by
    /// someone else reports `OwnerMismatch`.
    async fn find_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<OwnedRankedItem, StoreError>;

    /// Number of live items of `owner_id` (committed state).
    async fn count_active(&self, owner_id: OwnerId) -> Result<Rank, StoreError>;
}

/// Owner-scoped unit of work.
///
/// Writes are staged until [`commit`](OwnerTransaction::commit). Dropping the
/// transaction without committing discards them, which is how errors,
/// timeouts and cancelled callers roll back.
#[async_trait]
pub trait OwnerTransaction: Send {
    fn owner_id(&self) -> OwnerId;

    /// Live items of the owner, as seen by this transaction.
    async fn count_active(&mut self) -> Result<Rank, StoreError>;

    /// Load a live item of this owner.
    async fn find_active(&mut self, item_id: ItemId) -> Result<OwnedRankedItem, StoreError>;

    /// Add `delta` to the rank of every live row with a rank in `range`.
    ///
    /// Returns the number of rows touched.
    async fn shift_ranks_in_range(
        &mut self,
        range: RankRange,
        delta: RankDelta,
        now: Timestamp,
    ) -> Result<u32, StoreError>;

    async fn set_rank(
        &mut self,
        item_id: ItemId,
        rank: Rank,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    async fn insert(&mut self, item: OwnedRankedItem) -> Result<(), StoreError>;

    /// Replace non-rank fields of an existing live item.
    async fn update(&mut self, item: OwnedRankedItem) -> Result<(), StoreError>;

    /// Remove the item from the ranking sequence.
    async fn soft_delete(&mut self, item_id: ItemId, now: Timestamp) -> Result<(), StoreError>;

    /// Publish every staged write atomically.
    async fn commit(&mut self) -> Result<(), StoreError>;
}

/// Key/value cache used by the consistency guard.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}
