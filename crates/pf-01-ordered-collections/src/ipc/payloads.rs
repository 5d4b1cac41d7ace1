//! Transport payloads for ordered collections
//!
//! Requests identify the acting owner explicitly; the handler never infers
//! ownership from the item.

use crate::domain::entities::{ItemPatch, NewItem};
use crate::domain::value_objects::{ItemId, OwnerId, SortOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================
// INCOMING REQUESTS
// ============================================================

/// Create an item at the top of the owner's collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    /// Correlation ID for response tracking
    pub correlation_id: Uuid,
    pub owner_id: OwnerId,
    pub item: NewItem,
}

/// Soft-delete an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteItemRequest {
    pub correlation_id: Uuid,
    pub owner_id: OwnerId,
    pub item_id: ItemId,
}

/// Move an item to a new rank.
///
/// The rank is signed so that zero and negative values coming off the wire
/// are rejected as invalid ranks rather than as malformed payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderItemRequest {
    pub correlation_id: Uuid,
    pub owner_id: OwnerId,
    pub item_id: ItemId,
    pub new_rank: i64,
}

/// Change non-rank fields of an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub correlation_id: Uuid,
    pub owner_id: OwnerId,
    pub item_id: ItemId,
    pub patch: ItemPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetItemRequest {
    pub correlation_id: Uuid,
    pub owner_id: OwnerId,
    pub item_id: ItemId,
}

/// One page of an owner's collection. Missing fields use configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItemsRequest {
    pub correlation_id: Uuid,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: SortOrder,
}

// ============================================================
// OUTGOING RESPONSES
// ============================================================

/// Response to any collection request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResponse {
    /// Correlation ID from request
    pub correlation_id: Uuid,
    /// HTTP-equivalent status code
    pub status: u16,
    /// Item, page or nothing (delete), on success
    pub body: Option<serde_json::Value>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl CollectionResponse {
    pub fn ok(correlation_id: Uuid, status: u16, body: Option<serde_json::Value>) -> Self {
        Self {
            correlation_id,
            status,
            body,
            error: None,
        }
    }

    pub fn failed(correlation_id: Uuid, status: u16, error: impl Into<String>) -> Self {
        Self {
            correlation_id,
            status,
            body: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
