//! # PF-01: Ordered Collections
//!
//! Per-owner ranked collections whose ranks stay dense across concurrent
//! inserts, deletes and reorders.
//!
//! ## Architecture
//!
//! - **Domain**: Items, shift plans, errors, ranking invariants
//! - **Algorithms**: Rank compactor (pure shift-plan computation)
//! - **Ports**: Inbound (`OrderedCollectionApi`) and Outbound (`OrderedItemStore`, `CacheBackend`, `TimeSource`)
//! - **Application**: `ReorderCoordinator`, owner locks, cache consistency guard
//! - **Adapters**: In-memory store, LRU cache, system clock
//! - **IPC**: Request handler and payloads
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Dense Ranking | Live ranks of an owner are exactly `{1..N}` |
//! | 2 | Atomic Mutation | Shift and subject write commit together or not at all |
//! | 3 | Owner Isolation | A mutation never reads or writes another owner's rows |
//! | 4 | Serialized Owners | Mutations of one owner never interleave |
//! | 5 | Cache Coherence | No read is served from an entry older than the last committed mutation it covers |
//!
//! ## Mutation Pipeline
//!
//! ```text
//! lock(owner) ─→ begin ─→ read rank(s) ─→ plan ─→ shift + write ─→ commit
//!                                                                     │
//!                                          unlock ←─ invalidate(scopes)
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod ports;

pub use adapters::{InMemoryOrderedItemStore, LruCacheBackend, StoreOperation, SystemTimeSource};
pub use application::{CacheConsistencyGuard, CacheKey, CacheScope, CacheStats, ReorderCoordinator};
pub use config::CollectionConfig;
pub use domain::entities::*;
pub use domain::errors::{CacheError, CollectionError, ConfigError, StoreError};
pub use domain::invariants::{check_dense_ranking, invariant_dense_ranking};
pub use domain::value_objects::*;
pub use ipc::{CollectionRequestHandler, CollectionResponse};
pub use ports::inbound::OrderedCollectionApi;
pub use ports::outbound::{CacheBackend, OrderedItemStore, OwnerTransaction, TimeSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
