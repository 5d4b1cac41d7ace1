//! Domain invariants for ordered collections
//!
//! Checked by store adapters before commit and by the test suites after
//! every operation.

use super::entities::OwnedRankedItem;
use super::value_objects::{OwnerId, Rank};

/// Dense ranking: the live ranks of one owner are exactly `{1, ..., N}`.
///
/// Returns a description of the first violation found.
pub fn check_dense_ranking(ranks: &[Rank]) -> Result<(), String> {
    let n = ranks.len();
    let mut seen = vec![false; n];

    for &rank in ranks {
        if rank == 0 || rank as usize > n {
            return Err(format!("rank {} outside [1, {}]", rank, n));
        }
        let slot = &mut seen[rank as usize - 1];
        if *slot {
            return Err(format!("rank {} assigned twice", rank));
        }
        *slot = true;
    }

    Ok(())
}

/// Convenience wrapper over [`check_dense_ranking`].
pub fn invariant_dense_ranking(ranks: &[Rank]) -> bool {
    check_dense_ranking(ranks).is_ok()
}

/// Dense ranking over the live rows of `owner_id` within `items`.
///
/// Rows of other owners and soft-deleted rows are ignored.
pub fn invariant_owner_dense<'a, I>(owner_id: OwnerId, items: I) -> bool
where
    I: IntoIterator<Item = &'a OwnedRankedItem>,
{
    let ranks: Vec<Rank> = items
        .into_iter()
        .filter(|item| item.owner_id == owner_id && !item.is_deleted())
        .map(|item| item.rank)
        .collect();
    invariant_dense_ranking(&ranks)
}
