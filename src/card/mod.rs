//! Card rendering: styles that build commands, and idempotent materialization.

/// Per-episode planning and creation.
pub mod materialize;
/// Card styles.
pub mod style;
