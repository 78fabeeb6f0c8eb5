//! Crate-wide building blocks.

/// Error taxonomy and result alias.
pub mod error;
