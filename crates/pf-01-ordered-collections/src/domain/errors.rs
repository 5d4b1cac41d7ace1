//! Error types for ordered collections
//!
//! `CollectionError` is what callers match on. Store and cache adapters report
//! through their own narrower enums, converted at the coordinator boundary.

use super::value_objects::{ItemId, OwnerId, Rank};
use thiserror::Error;

/// All errors a collection operation can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// Item does not exist or is already soft-deleted.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// Requested rank is outside `[1, max]`.
    #[error("Invalid rank {requested}: must be within [1, {max}]")]
    InvalidRank { requested: i64, max: Rank },

    /// Item exists but is owned by someone else.
    #[error("Item {item_id} is not owned by {owner_id}")]
    OwnerMismatch { item_id: ItemId, owner_id: OwnerId },

    /// Another mutation for the same owner committed first.
    #[error("Concurrent modification of owner {owner_id}")]
    ConcurrencyConflict { owner_id: OwnerId },

    /// Persistence backend failed.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unit of work did not finish within the configured budget.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Commit refused: staged ranks were not dense.
    #[error("Ranking invariant violated for owner {owner_id}: {detail}")]
    InvariantViolation { owner_id: OwnerId, detail: String },

    /// Page or limit was zero.
    #[error("Invalid page request: page {page}, limit {limit}")]
    InvalidPage { page: u32, limit: u32 },

    /// Update carried no changes.
    #[error("Patch contains no changes")]
    EmptyPatch,
}

impl CollectionError {
    /// Only conflicts are expected to succeed on a fresh attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollectionError::ConcurrencyConflict { .. })
    }

    /// HTTP-equivalent status for transport adapters.
    ///
    /// Ownership mismatches report 404 so item existence never leaks across
    /// owners.
    pub fn status_code(&self) -> u16 {
        match self {
            CollectionError::ItemNotFound { .. } | CollectionError::OwnerMismatch { .. } => 404,
            CollectionError::InvalidRank { .. }
            | CollectionError::InvalidPage { .. }
            | CollectionError::EmptyPatch => 400,
            CollectionError::ConcurrencyConflict { .. } => 409,
            CollectionError::StoreUnavailable(_) => 503,
            CollectionError::Timeout { .. } => 504,
            CollectionError::InvariantViolation { .. } => 500,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// An ownership mismatch reads exactly like an unknown id; the detailed
    /// text stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            CollectionError::OwnerMismatch { item_id, .. } => {
                CollectionError::ItemNotFound { item_id: *item_id }.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Errors reported by an `OrderedItemStore` adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Item not found: {item_id}")]
    NotFound { item_id: ItemId },

    #[error("Item {item_id} is not owned by {owner_id}")]
    OwnerMismatch { item_id: ItemId, owner_id: OwnerId },

    #[error("Owner {owner_id} changed since version {expected} (now {actual})")]
    Conflict {
        owner_id: OwnerId,
        expected: u64,
        actual: u64,
    },

    #[error("Ranking invariant violated for owner {owner_id}: {detail}")]
    InvariantViolation { owner_id: OwnerId, detail: String },

    #[error("Duplicate item id: {item_id}")]
    DuplicateItem { item_id: ItemId },

    #[error("Store I/O failure: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CollectionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { item_id } => CollectionError::ItemNotFound { item_id },
            StoreError::OwnerMismatch { item_id, owner_id } => {
                CollectionError::OwnerMismatch { item_id, owner_id }
            }
            StoreError::Conflict { owner_id, .. } => {
                CollectionError::ConcurrencyConflict { owner_id }
            }
            StoreError::InvariantViolation { owner_id, detail } => {
                CollectionError::InvariantViolation { owner_id, detail }
            }
            other => CollectionError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Coordinator settings that cannot be run with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),
}

/// Errors reported by a `CacheBackend` adapter.
///
/// The consistency guard treats these as degradations, never as failures of
/// the read or write that triggered them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cached value could not be decoded: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}
