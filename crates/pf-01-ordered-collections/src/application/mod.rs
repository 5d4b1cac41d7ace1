//! Application layer for ordered collections
//!
//! The coordinator plus the concurrency and caching machinery it composes.

pub mod cache_guard;
pub mod cache_keys;
pub mod owner_locks;
pub mod service;

pub use cache_guard::{CacheConsistencyGuard, CacheStats};
pub use cache_keys::{CacheKey, CacheScope};
pub use owner_locks::{OwnerLockGuard, OwnerLockTable};
pub use service::ReorderCoordinator;
