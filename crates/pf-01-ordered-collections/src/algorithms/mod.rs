//! Algorithms module for ordered collections
//!
//! Contains the rank compactor: shift-plan computation for insert, delete and
//! move.

pub mod rank_compactor;

pub use rank_compactor::{plan_delete_and_compact, plan_insert_at_top, plan_move, validate_rank};
