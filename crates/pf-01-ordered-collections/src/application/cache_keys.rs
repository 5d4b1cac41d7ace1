//! Cache keys and invalidation scopes
//!
//! A key names one cached read. A scope names a set of keys that a mutation
//! invalidates together. Every key depends on one or more scopes, and the
//! rendered key string carries the current epoch of each of them, so bumping
//! a scope's epoch makes every key that depends on it unreachable at once.
//!
//! | Read | Base key | Depends on |
//! |------|----------|------------|
//! | listing | `{kind}:listing:{owner}:p{page}:l{limit}:s{sort}` | owner |
//! | single item | `{kind}:item:{item}` | item, owner |
//!
//! Single items depend on the owner scope because inserting, deleting or
//! moving any item renumbers its siblings.
//!
//! A scope's current epoch is itself stored in the cache backend under
//! `{scope}:epoch`, so every process sharing a backend sees the same epochs.

use crate::domain::value_objects::{CollectionKind, ItemId, OwnerId, PageRequest, SortOrder};
use std::fmt;

/// Unit of invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// Everything derived from one owner's ranking.
    Owner {
        kind: CollectionKind,
        owner_id: OwnerId,
    },
    /// One item's own fields.
    Item {
        kind: CollectionKind,
        item_id: ItemId,
    },
}

impl CacheScope {
    pub fn owner(kind: CollectionKind, owner_id: OwnerId) -> Self {
        CacheScope::Owner { kind, owner_id }
    }

    pub fn item(kind: CollectionKind, item_id: ItemId) -> Self {
        CacheScope::Item { kind, item_id }
    }

    /// Backend key holding this scope's current epoch.
    pub fn epoch_key(&self) -> String {
        format!("{}:epoch", self)
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheScope::Owner { kind, owner_id } => write!(f, "{}:owner:{}", kind, owner_id),
            CacheScope::Item { kind, item_id } => write!(f, "{}:item:{}", kind, item_id),
        }
    }
}

/// A cacheable read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKey {
    base: String,
    scopes: Vec<CacheScope>,
}

impl CacheKey {
    /// One page of an owner's collection.
    pub fn listing(
        kind: CollectionKind,
        owner_id: OwnerId,
        page: PageRequest,
        sort: SortOrder,
    ) -> Self {
        Self {
            base: format!(
                "{}:listing:{}:p{}:l{}:s{}",
                kind,
                owner_id,
                page.page,
                page.limit,
                sort.as_str()
            ),
            scopes: vec![CacheScope::owner(kind, owner_id)],
        }
    }

    /// One item, read on behalf of `owner_id`.
    pub fn item(kind: CollectionKind, owner_id: OwnerId, item_id: ItemId) -> Self {
        Self {
            base: format!("{}:item:{}", kind, item_id),
            scopes: vec![
                CacheScope::item(kind, item_id),
                CacheScope::owner(kind, owner_id),
            ],
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn scopes(&self) -> &[CacheScope] {
        &self.scopes
    }

    /// Concrete backend key for the given scope epochs (same order as
    /// [`scopes`](Self::scopes)).
    pub fn render<S: AsRef<str>>(&self, epochs: &[S]) -> String {
        let tags: Vec<&str> = epochs.iter().map(|e| e.as_ref()).collect();
        format!("{}:v{}", self.base, tags.join("."))
    }
}
