//! Core entities for ordered collections

use super::value_objects::{ItemId, OwnerId, Rank, SortOrder, Timestamp};
use serde::{Deserialize, Serialize};

/// One row of an owner's ordered collection (a technology, an application...).
///
/// Collection-specific fields live in `payload`; this crate never interprets
/// them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnedRankedItem {
    pub id: ItemId,
    pub owner_id: OwnerId,
    pub rank: Rank,
    pub active: bool,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Set once the item leaves its owner's ranking sequence.
    pub deleted_at: Option<Timestamp>,
}

impl OwnedRankedItem {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Payload accepted by `create`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub payload: serde_json::Value,
}

fn default_active() -> bool {
    true
}

impl NewItem {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            active: true,
            payload,
        }
    }

    /// Materialize the row that gets inserted at the top of the collection.
    pub fn into_item(self, owner_id: OwnerId, now: Timestamp) -> OwnedRankedItem {
        OwnedRankedItem {
            id: ItemId::new(),
            owner_id,
            rank: 1,
            active: self.active,
            payload: self.payload,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Non-rank changes to an existing item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub active: Option<bool>,
    pub payload: Option<serde_json::Value>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.payload.is_none()
    }

    pub fn apply(self, item: &mut OwnedRankedItem, now: Timestamp) {
        if let Some(active) = self.active {
            item.active = active;
        }
        if let Some(payload) = self.payload {
            item.payload = payload;
        }
        item.updated_at = now;
    }
}

/// Listing request as seen by the read path.
///
/// `page` is 1-based; a missing `limit` falls back to the configured default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl ListQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            sort: SortOrder::RankAscending,
        }
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// One page of an owner's collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemPage {
    pub items: Vec<OwnedRankedItem>,
    pub page: u32,
    pub limit: u32,
    pub sort: SortOrder,
    /// Live items the owner has in total.
    pub total: u32,
}

impl ItemPage {
    pub fn ranks(&self) -> Vec<Rank> {
        self.items.iter().map(|item| item.rank).collect()
    }
}
