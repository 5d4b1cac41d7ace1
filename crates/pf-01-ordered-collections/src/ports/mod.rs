//! Ports module for ordered collections
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::OrderedCollectionApi;
pub use outbound::{CacheBackend, OrderedItemStore, OwnerTransaction, TimeSource};
