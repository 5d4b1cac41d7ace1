//! Value objects for ordered collections
//!
//! Identifiers, ranks, rank ranges and the shift plans computed over them.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 1-based position of an item within its owner's collection.
pub type Rank = u32;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Globally unique item identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Owner whose items share one ranking sequence.
///
/// Resolved by the caller (e.g. from a username) before it reaches this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of ordered collection a coordinator serves.
///
/// Used as the resource component of cache keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Technology,
    Application,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Technology => "technology",
            CollectionKind::Application => "application",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed range of ranks `[low, high]`.
///
/// Half-open ranges from the planning rules are normalised to closed bounds
/// when the plan is built, so an empty range is simply never constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRange {
    pub low: Rank,
    pub high: Rank,
}

impl RankRange {
    /// Returns `None` when the range would be empty.
    pub fn new(low: Rank, high: Rank) -> Option<Self> {
        if low == 0 || low > high {
            return None;
        }
        Some(Self { low, high })
    }

    pub fn contains(&self, rank: Rank) -> bool {
        rank >= self.low && rank <= self.high
    }

    pub fn len(&self) -> u32 {
        self.high - self.low + 1
    }

    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }
}

/// Direction every rank in a shift range moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDelta {
    /// +1: rows move down the list.
    Increment,
    /// -1: rows move up the list.
    Decrement,
}

impl RankDelta {
    pub fn apply(&self, rank: Rank) -> Rank {
        match self {
            RankDelta::Increment => rank + 1,
            RankDelta::Decrement => rank.saturating_sub(1),
        }
    }
}

/// Bulk renumbering of every row whose rank falls in `range`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankShift {
    pub range: RankRange,
    pub delta: RankDelta,
}

/// Renumbering computed for one mutation.
///
/// `shift` applies to every other row of the owner; `target_rank` is the rank
/// the inserted or moved row ends up with. Neither is set for a no-op move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftPlan {
    pub shift: Option<RankShift>,
    pub target_rank: Option<Rank>,
}

impl ShiftPlan {
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.shift.is_none() && self.target_rank.is_none()
    }

    /// New rank of a row that is not the subject of the plan.
    pub fn shifted(&self, rank: Rank) -> Rank {
        match self.shift {
            Some(shift) if shift.range.contains(rank) => shift.delta.apply(rank),
            _ => rank,
        }
    }

    /// Number of rows the shift touches, given a dense sequence.
    pub fn rows_affected(&self) -> u32 {
        self.shift.map(|s| s.range.len()).unwrap_or(0)
    }
}

/// Listing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    RankAscending,
    RankDescending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::RankAscending => "rank_asc",
            SortOrder::RankDescending => "rank_desc",
        }
    }
}

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}
