//! Domain types for the `dockhand` container entrypoint.
//!
//! Everything here is free of process management: configuration parsing,
//! directory and owner specs, classification of entrypoint files, the SQL
//! load queue, the workload command, and the readiness retry policy. The
//! `dockhand-entrypoint` crate drives these types against real processes.

pub mod classify;
pub mod command;
pub mod config;
pub mod dirs;
pub mod error;
pub mod queue;
pub mod retry;
