//! Batch maintenance over every configured show.

/// The maintainer.
pub mod orchestrator;
/// Per-show and per-batch results.
pub mod report;
