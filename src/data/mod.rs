//! Per-show episode data files.

/// Tab-delimited episode store.
pub mod store;
