//! Backup job orchestration.
//!
//! A [`backup::Model`] names a job, registers database, compressor and
//! storage adapters through a builder closure, and runs the pipeline once:
//! dump into a workspace, package it with `tar`, compress, hand the artifact
//! to every storage and clean up.

pub mod adapters;
pub mod backup;
pub mod config;
pub mod errors;
pub mod utils;

#[cfg(test)]
mod testing;

pub use errors::{BackupError, Result};
