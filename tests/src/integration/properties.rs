//! # Property Tests
//!
//! Random create/delete/move sequences checked against a plain `Vec` model
//! of the expected order, through both the store and the cached read path.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use crate::in_memory_coordinator;
    use pf_01_ordered_collections::{
        invariant_dense_ranking, CollectionConfig, CollectionKind, ItemId, ListQuery, NewItem,
        OrderedCollectionApi, OwnerId, Rank,
    };

    #[derive(Clone, Debug)]
    enum Op {
        Create,
        /// Delete the item at this position (mod length).
        Delete(usize),
        /// Move the item at this position (mod length) to this rank (mod length, 1-based).
        Move(usize, u32),
        /// Read the listing, so later reads can be served from cache.
        List,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Create),
            1 => any::<usize>().prop_map(Op::Delete),
            2 => (any::<usize>(), any::<u32>()).prop_map(|(i, r)| Op::Move(i, r)),
            2 => Just(Op::List),
        ]
    }

    fn run(ops: Vec<Op>) -> Result<(), TestCaseError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        runtime.block_on(async move {
            let (coordinator, store) =
                in_memory_coordinator(CollectionKind::Technology, CollectionConfig::default());
            let owner = OwnerId::new();
            // Ids in rank order.
            let mut model: Vec<ItemId> = Vec::new();

            for op in ops {
                match op {
                    Op::Create => {
                        let item = coordinator
                            .create(owner, NewItem::new(json!({})))
                            .await
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                        prop_assert_eq!(item.rank, 1);
                        model.insert(0, item.id);
                    }
                    Op::Delete(_) | Op::Move(..) if model.is_empty() => {}
                    Op::Delete(i) => {
                        let id = model.remove(i % model.len());
                        coordinator
                            .delete(owner, id)
                            .await
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    }
                    Op::Move(i, r) => {
                        let len = model.len();
                        let new_rank = (r as usize % len) + 1;
                        let id = model.remove(i % len);
                        model.insert(new_rank - 1, id);
                        let moved = coordinator
                            .move_item(owner, id, new_rank as Rank)
                            .await
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                        prop_assert_eq!(moved.rank as usize, new_rank);
                    }
                    Op::List => {
                        coordinator
                            .list(owner, ListQuery::page(1, 100))
                            .await
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    }
                }

                let committed: Vec<ItemId> =
                    store.live_items(owner).iter().map(|item| item.id).collect();
                prop_assert_eq!(&committed, &model);

                let ranks: Vec<Rank> = store.live_items(owner).iter().map(|i| i.rank).collect();
                prop_assert!(invariant_dense_ranking(&ranks));
            }

            let served = coordinator
                .list(owner, ListQuery::page(1, 100))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let served: Vec<ItemId> = served.items.iter().map(|item| item.id).collect();
            prop_assert_eq!(served, model);
            Ok(())
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_random_sequences_match_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
            run(ops)?;
        }
    }
}
