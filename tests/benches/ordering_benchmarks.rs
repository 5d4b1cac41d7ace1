//! # Ordered Collections Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | Rank compactor | plan computation | O(1), independent of N |
//! | Coordinator | create / move on an N-item owner | O(N) shift, dominated by store |
//! | Cache guard | cached listing read | no store access |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pf_01_ordered_collections::algorithms::{plan_delete_and_compact, plan_insert_at_top, plan_move};
use pf_01_ordered_collections::{
    CollectionKind, InMemoryOrderedItemStore, ItemId, ListQuery, NewItem, OrderedCollectionApi,
    OwnerId, ReorderCoordinator,
};
use rand::Rng;
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;

// ============================================================================
// Rank Compactor
// ============================================================================

fn bench_compactor(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank-compactor");

    for max in [10u32, 1_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::new("plan_move", max), &max, |b, &max| {
            let mut rng = rand::thread_rng();
            b.iter(|| {
                let old = rng.gen_range(1..=max);
                let new = rng.gen_range(1..=max);
                black_box(plan_move(old, new, max))
            })
        });

        group.bench_with_input(BenchmarkId::new("plan_delete", max), &max, |b, &max| {
            b.iter(|| black_box(plan_delete_and_compact(black_box(max / 2 + 1), max)))
        });

        group.bench_with_input(BenchmarkId::new("plan_insert", max), &max, |b, &max| {
            b.iter(|| black_box(plan_insert_at_top(black_box(max))))
        });
    }

    group.finish();
}

// ============================================================================
// Coordinator
// ============================================================================

fn seeded(runtime: &Runtime, size: usize) -> (ReorderCoordinator, OwnerId, Vec<ItemId>) {
    let coordinator =
        ReorderCoordinator::in_memory(CollectionKind::Technology, InMemoryOrderedItemStore::new());
    let owner = OwnerId::new();
    let ids = runtime.block_on(async {
        let mut ids = Vec::with_capacity(size);
        for n in 0..size {
            let item = coordinator
                .create(owner, NewItem::new(json!({ "n": n })))
                .await
                .expect("seed create");
            ids.push(item.id);
        }
        ids
    });
    (coordinator, owner, ids)
}

fn bench_coordinator(c: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("reorder-coordinator");
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(1));

    for size in [10usize, 100, 1_000] {
        let (coordinator, owner, ids) = seeded(&runtime, size);

        group.bench_with_input(BenchmarkId::new("move_item", size), &size, |b, &size| {
            let mut rng = rand::thread_rng();
            b.iter(|| {
                let id = ids[rng.gen_range(0..ids.len())];
                let rank = rng.gen_range(1..=size as u32);
                runtime
                    .block_on(coordinator.move_item(owner, id, rank))
                    .expect("move")
            })
        });

        group.bench_with_input(BenchmarkId::new("list_cached", size), &size, |b, _| {
            b.iter(|| {
                runtime
                    .block_on(coordinator.list(owner, ListQuery::page(1, 20)))
                    .expect("list")
            })
        });
    }

    group.bench_function("create_into_empty_owner", |b| {
        let coordinator = ReorderCoordinator::in_memory(
            CollectionKind::Application,
            InMemoryOrderedItemStore::new(),
        );
        b.iter(|| {
            runtime
                .block_on(coordinator.create(OwnerId::new(), NewItem::new(json!({}))))
                .expect("create")
        })
    });

    group.finish();
}

criterion_group!(benches, bench_compactor, bench_coordinator);
criterion_main!(benches);
