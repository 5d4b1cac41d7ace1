//! # Collection Flow Tests
//!
//! End-to-end flows across handler, coordinator, cache guard and store,
//! with custom outbound adapters plugged into the ports.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    use crate::init_test_logging;
    use pf_01_ordered_collections::ipc::{
        CreateItemRequest, DeleteItemRequest, GetItemRequest, ListItemsRequest,
        ReorderItemRequest, UpdateItemRequest,
    };
    use pf_01_ordered_collections::{
        invariant_dense_ranking, CacheBackend, CacheConsistencyGuard, CacheError,
        CollectionConfig, CollectionError, CollectionKind, CollectionRequestHandler,
        InMemoryOrderedItemStore, ItemPage, ItemPatch, ListQuery, LruCacheBackend, NewItem,
        OrderedCollectionApi, OwnedRankedItem, OwnerId, ReorderCoordinator, SortOrder,
        TimeSource, Timestamp,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Clock that advances 1000ms per reading.
    #[derive(Default)]
    struct SteppingClock {
        now: AtomicU64,
    }

    impl TimeSource for SteppingClock {
        fn now(&self) -> Timestamp {
            self.now.fetch_add(1_000, Ordering::SeqCst) + 1_000
        }
    }

    /// LRU backend that records every key it is asked to delete.
    #[derive(Default)]
    struct RecordingCache {
        inner: LruCacheBackend,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CacheBackend for RecordingCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.deleted.lock().push(key.to_string());
            self.inner.delete(key).await
        }
    }

    /// Backend that is always down.
    struct UnreachableCache;

    #[async_trait]
    impl CacheBackend for UnreachableCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection reset".into()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection reset".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection reset".into()))
        }
    }

    fn coordinator_with(
        backend: Arc<dyn CacheBackend>,
    ) -> (ReorderCoordinator, InMemoryOrderedItemStore) {
        init_test_logging();
        let store = InMemoryOrderedItemStore::new();
        let coordinator = ReorderCoordinator::new(
            CollectionKind::Application,
            Arc::new(store.clone()),
            CacheConsistencyGuard::new(backend),
            Arc::new(SteppingClock::default()),
            CollectionConfig::default(),
        )
        .unwrap();
        (coordinator, store)
    }

    fn names(page: &ItemPage) -> Vec<String> {
        page.items
            .iter()
            .map(|item| item.payload["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    async fn create_named(coordinator: &ReorderCoordinator, owner: OwnerId, name: &str) -> OwnedRankedItem {
        coordinator
            .create(owner, NewItem::new(json!({ "name": name })))
            .await
            .unwrap()
    }

    // =============================================================================
    // HANDLER FLOWS
    // =============================================================================

    /// A user builds, reorders, edits and trims a technology list.
    #[tokio::test]
    async fn test_technology_list_lifecycle() {
        let handler = CollectionRequestHandler::in_memory(CollectionKind::Technology);
        let owner = OwnerId::new();

        let mut created = Vec::new();
        for name in ["Rust", "Go", "Zig"] {
            let response = handler
                .handle_create(CreateItemRequest {
                    correlation_id: Uuid::new_v4(),
                    owner_id: owner,
                    item: NewItem::new(json!({ "name": name })),
                })
                .await;
            assert_eq!(response.status, 201);
            let item: OwnedRankedItem = serde_json::from_value(response.body.unwrap()).unwrap();
            created.push(item);
        }
        // Zig, Go, Rust
        let (rust, go, zig) = (&created[0], &created[1], &created[2]);

        let moved = handler
            .handle_reorder(ReorderItemRequest {
                correlation_id: Uuid::new_v4(),
                owner_id: owner,
                item_id: rust.id,
                new_rank: 1,
            })
            .await;
        assert_eq!(moved.status, 200);
        assert_eq!(moved.body.unwrap()["rank"], 1);

        let updated = handler
            .handle_update(UpdateItemRequest {
                correlation_id: Uuid::new_v4(),
                owner_id: owner,
                item_id: go.id,
                patch: ItemPatch {
                    active: Some(false),
                    payload: Some(json!({ "name": "Go", "years": 3 })),
                },
            })
            .await;
        assert_eq!(updated.status, 200);

        let deleted = handler
            .handle_delete(DeleteItemRequest {
                correlation_id: Uuid::new_v4(),
                owner_id: owner,
                item_id: zig.id,
            })
            .await;
        assert_eq!(deleted.status, 204);

        let listing = handler
            .handle_list(ListItemsRequest {
                correlation_id: Uuid::new_v4(),
                owner_id: owner,
                page: Some(1),
                limit: Some(10),
                sort: SortOrder::RankDescending,
            })
            .await;
        let page: ItemPage = serde_json::from_value(listing.body.unwrap()).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.ranks(), vec![2, 1]);
        assert_eq!(page.items[0].id, go.id);
        assert!(!page.items[0].active);
        assert_eq!(page.items[0].payload["years"], 3);

        let gone = handler
            .handle_get(GetItemRequest {
                correlation_id: Uuid::new_v4(),
                owner_id: owner,
                item_id: zig.id,
            })
            .await;
        assert_eq!(gone.status, 404);
    }

    // =============================================================================
    // CACHE INTEGRATION
    // =============================================================================

    #[tokio::test]
    async fn test_mutation_retires_owner_epoch_in_backend() {
        let backend = Arc::new(RecordingCache::default());
        let (coordinator, _store) = coordinator_with(backend.clone());
        let owner = OwnerId::new();

        create_named(&coordinator, owner, "a").await;
        coordinator.list(owner, ListQuery::default()).await.unwrap();
        // Owner epoch plus the listing.
        assert_eq!(backend.inner.len(), 2);
        backend.deleted.lock().clear();

        create_named(&coordinator, owner, "b").await;

        let deleted = backend.deleted.lock().clone();
        assert_eq!(deleted, vec![format!("application:owner:{}:epoch", owner)]);

        let page = coordinator.list(owner, ListQuery::default()).await.unwrap();
        assert_eq!(names(&page), vec!["b", "a"]);
    }

    /// Two processes sharing one database and one cache.
    #[tokio::test]
    async fn test_coordinators_sharing_a_cache_stay_coherent() {
        let store = InMemoryOrderedItemStore::new();
        let backend: Arc<dyn CacheBackend> = Arc::new(LruCacheBackend::new());
        let node = || {
            ReorderCoordinator::new(
                CollectionKind::Application,
                Arc::new(store.clone()),
                CacheConsistencyGuard::new(backend.clone()),
                Arc::new(SteppingClock::default()),
                CollectionConfig::default(),
            )
            .unwrap()
        };
        let (east, west) = (node(), node());
        let owner = OwnerId::new();

        let first = create_named(&east, owner, "a").await;
        let before = west.list(owner, ListQuery::default()).await.unwrap();
        assert_eq!(before.total, 1);
        assert_eq!(west.get_item(owner, first.id).await.unwrap().rank, 1);

        create_named(&east, owner, "b").await;

        let after = west.list(owner, ListQuery::default()).await.unwrap();
        assert_eq!(after.total, 2);
        assert_eq!(names(&after), vec!["b", "a"]);
        assert_eq!(west.get_item(owner, first.id).await.unwrap().rank, 2);

        west.delete(owner, first.id).await.unwrap();
        let trimmed = east.list(owner, ListQuery::default()).await.unwrap();
        assert_eq!(names(&trimmed), vec!["b"]);
    }

    #[tokio::test]
    async fn test_reads_are_served_from_cache_until_mutation() {
        let (coordinator, _store) = coordinator_with(Arc::new(LruCacheBackend::new()));
        let owner = OwnerId::new();
        let item = create_named(&coordinator, owner, "a").await;

        for _ in 0..3 {
            coordinator.get_item(owner, item.id).await.unwrap();
        }
        let stats = coordinator.cache().stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);

        create_named(&coordinator, owner, "b").await;
        let refreshed = coordinator.get_item(owner, item.id).await.unwrap();
        assert_eq!(refreshed.rank, 2);
        assert_eq!(coordinator.cache().stats().misses, 2);
    }

    #[tokio::test]
    async fn test_cache_outage_does_not_fail_operations() {
        let (coordinator, store) = coordinator_with(Arc::new(UnreachableCache));
        let owner = OwnerId::new();

        let first = create_named(&coordinator, owner, "a").await;
        create_named(&coordinator, owner, "b").await;
        coordinator.move_item(owner, first.id, 1).await.unwrap();

        let page = coordinator.list(owner, ListQuery::default()).await.unwrap();
        assert_eq!(names(&page), vec!["a", "b"]);
        assert_eq!(store.live_items(owner).len(), 2);
    }

    // =============================================================================
    // PORT CONTRACTS
    // =============================================================================

    #[tokio::test]
    async fn test_timestamps_come_from_injected_clock() {
        let (coordinator, store) = coordinator_with(Arc::new(LruCacheBackend::new()));
        let owner = OwnerId::new();

        let first = create_named(&coordinator, owner, "a").await;
        assert_eq!(first.created_at, 1_000);

        create_named(&coordinator, owner, "b").await;
        let pushed = store
            .live_items(owner)
            .into_iter()
            .find(|item| item.id == first.id)
            .unwrap();

        // Shifted rows are stamped by the mutation that moved them.
        assert_eq!(pushed.created_at, 1_000);
        assert_eq!(pushed.updated_at, 2_000);
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let (coordinator, store) = coordinator_with(Arc::new(LruCacheBackend::new()));
        let (alice, bob) = (OwnerId::new(), OwnerId::new());

        let alice_item = create_named(&coordinator, alice, "a1").await;
        create_named(&coordinator, alice, "a2").await;
        create_named(&coordinator, bob, "b1").await;

        coordinator.delete(alice, alice_item.id).await.unwrap();
        assert_eq!(
            coordinator.delete(bob, alice_item.id).await,
            Err(CollectionError::OwnerMismatch {
                item_id: alice_item.id,
                owner_id: bob
            })
        );

        let bob_ranks: Vec<u32> = store.live_items(bob).iter().map(|i| i.rank).collect();
        assert_eq!(bob_ranks, vec![1]);
        let alice_ranks: Vec<u32> = store.live_items(alice).iter().map(|i| i.rank).collect();
        assert!(invariant_dense_ranking(&alice_ranks));
    }
}
