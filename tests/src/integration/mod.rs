//! Cross-module integration tests.

pub mod collection_flows;
pub mod properties;
