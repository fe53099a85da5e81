//! Offline CLI commands. Each opens the configured database (or none) and
//! prints to stdout; diagnostics go to stderr.

pub mod export;
pub mod id;
pub mod stats;
