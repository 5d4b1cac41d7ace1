//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports.

mod clock;
mod lru_cache;
mod memory_store;

pub use clock::SystemTimeSource;
pub use lru_cache::{LruCacheBackend, DEFAULT_CACHE_CAPACITY};
pub use memory_store::{InMemoryOrderedItemStore, InMemoryTransaction, StoreOperation};
