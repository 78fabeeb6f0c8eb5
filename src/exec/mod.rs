//! External command execution for renderers.

/// Host/container command runner.
pub mod runner;
