//! Rank compaction planning
//!
//! Pure functions that turn "insert / delete / move" into a shift plan over a
//! dense ranking `{1, ..., N}`. No I/O happens here; the only failure is rank
//! validation.
//!
//! | Operation | Shift range | Delta | Subject ends at |
//! |-----------|-------------|-------|-----------------|
//! | insert at top | `[1, N]` | +1 | 1 |
//! | delete rank `d` | `(d, N]` | -1 | removed |
//! | move `o -> n`, `n > o` | `(o, n]` | -1 | `n` |
//! | move `o -> n`, `n < o` | `[n, o)` | +1 | `n` |
//! | move `o -> o` | none | - | unchanged |
//!
//! The subject row is never inside its own shift range, so after the shift
//! and the subject's rank write no two rows share a rank.

use crate::domain::errors::CollectionError;
use crate::domain::value_objects::{Rank, RankDelta, RankRange, RankShift, ShiftPlan};

/// Plan for a new row entering at rank 1 with `current_max` rows present.
///
/// Works for an empty collection: the shift is simply absent.
pub fn plan_insert_at_top(current_max: Rank) -> ShiftPlan {
    ShiftPlan {
        shift: RankRange::new(1, current_max).map(|range| RankShift {
            range,
            delta: RankDelta::Increment,
        }),
        target_rank: Some(1),
    }
}

/// Plan for removing the row at `deleted_rank` and closing the gap.
pub fn plan_delete_and_compact(
    deleted_rank: Rank,
    current_max: Rank,
) -> Result<ShiftPlan, CollectionError> {
    ensure_in_range(deleted_rank as i64, current_max)?;

    Ok(ShiftPlan {
        shift: RankRange::new(deleted_rank + 1, current_max).map(|range| RankShift {
            range,
            delta: RankDelta::Decrement,
        }),
        target_rank: None,
    })
}

/// Plan for moving the row at `old_rank` to `new_rank`.
pub fn plan_move(
    old_rank: Rank,
    new_rank: Rank,
    current_max: Rank,
) -> Result<ShiftPlan, CollectionError> {
    ensure_in_range(old_rank as i64, current_max)?;
    ensure_in_range(new_rank as i64, current_max)?;

    if new_rank == old_rank {
        return Ok(ShiftPlan::noop());
    }

    let shift = if new_rank > old_rank {
        RankRange::new(old_rank + 1, new_rank).map(|range| RankShift {
            range,
            delta: RankDelta::Decrement,
        })
    } else {
        RankRange::new(new_rank, old_rank - 1).map(|range| RankShift {
            range,
            delta: RankDelta::Increment,
        })
    };

    Ok(ShiftPlan {
        shift,
        target_rank: Some(new_rank),
    })
}

/// Validate a caller-supplied rank against a collection of `current_max` rows.
///
/// Accepts a signed value so that negative and zero inputs from the transport
/// are rejected with the same error as out-of-range ones.
pub fn validate_rank(requested: i64, current_max: Rank) -> Result<Rank, CollectionError> {
    ensure_in_range(requested, current_max)?;
    Ok(requested as Rank)
}

fn ensure_in_range(requested: i64, current_max: Rank) -> Result<(), CollectionError> {
    if requested < 1 || requested > current_max as i64 {
        return Err(CollectionError::InvalidRank {
            requested,
            max: current_max,
        });
    }
    Ok(())
}
