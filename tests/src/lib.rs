//! # Ordered Collections Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── ordering_benchmarks.rs   # Compactor and coordinator throughput
//! └── src/integration/
//!     ├── collection_flows.rs      # End-to-end flows through the handler
//!     ├── concurrency.rs           # Parallel mutations, cancellation, shared stores
//!     └── properties.rs            # Random operation sequences vs. a model
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pf-tests
//! cargo test -p pf-tests integration::concurrency::
//! cargo bench -p pf-tests
//! PF_LOG_LEVEL=debug cargo test -p pf-tests -- --nocapture
//! ```

#![allow(dead_code)]

pub mod integration;

use pf_01_ordered_collections::{
    CollectionConfig, CollectionKind, InMemoryOrderedItemStore, ReorderCoordinator,
};
use pf_telemetry::{init_logging, TelemetryConfig, TelemetryError};
use std::env;
use std::sync::Once;

/// Install the suite's log subscriber, once per test binary.
///
/// Quiet unless `PF_LOG_LEVEL` or `RUST_LOG` asks for more.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let mut config = TelemetryConfig::for_service("pf-tests");
        if env::var("PF_LOG_LEVEL").is_err() && env::var("RUST_LOG").is_err() {
            config.log_level = "error".to_string();
        }
        match init_logging(&config) {
            Ok(()) | Err(TelemetryError::AlreadyInitialized) => {}
            Err(err) => panic!("test logging: {err}"),
        }
    });
}

/// Coordinator over a fresh in-memory store, plus a handle on that store.
pub fn in_memory_coordinator(
    kind: CollectionKind,
    config: CollectionConfig,
) -> (ReorderCoordinator, InMemoryOrderedItemStore) {
    init_test_logging();
    let store = InMemoryOrderedItemStore::new();
    let coordinator = ReorderCoordinator::in_memory(kind, store.clone())
        .with_config(config)
        .expect("test config must be valid");
    (coordinator, store)
}
