//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{ItemPage, ItemPatch, ListQuery, NewItem, OwnedRankedItem};
use crate::domain::errors::CollectionError;
use crate::domain::value_objects::{ItemId, OwnerId, Rank};
use async_trait::async_trait;

/// Ordered collection API.
///
/// Every mutation is all-or-nothing and leaves the owner's ranks dense.
/// Reads may be served from cache but never from an entry computed before the
/// latest committed mutation of the data they cover.
#[async_trait]
pub trait OrderedCollectionApi: Send + Sync {
    /// Insert a new item at rank 1, pushing every other item of the owner
    /// down by one.
    async fn create(
        &self,
        owner_id: OwnerId,
        item: NewItem,
    ) -> Result<OwnedRankedItem, CollectionError>;

    /// Soft-delete an item and close the gap it leaves.
    async fn delete(&self, owner_id: OwnerId, item_id: ItemId) -> Result<(), CollectionError>;

    /// Move an item to `new_rank`, shifting the items in between.
    async fn move_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        new_rank: Rank,
    ) -> Result<OwnedRankedItem, CollectionError>;

    /// Change non-rank fields of an item.
    async fn update(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> Result<OwnedRankedItem, CollectionError>;

    async fn get_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<OwnedRankedItem, CollectionError>;

    async fn list(&self, owner_id: OwnerId, query: ListQuery)
        -> Result<ItemPage, CollectionError>;
}
