//! Storage layer for ClinicDB
//!
//! This crate implements durable, per-table storage with:
//! - TableContainer: one JSON Lines file per table, rewritten atomically
//! - codec: the single row ⇄ line serialization boundary
//! - TableSnapshot: immutable in-memory view with id and unique indices
//! - TableCache: current snapshot, swapped atomically on each mutation
//!
//! # Reads vs writes
//!
//! Reads clone the current snapshot `Arc` and never touch disk.
//! Writes build a successor snapshot, persist it through the container,
//! then publish it. Ordering writes is the concurrency layer's job.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod codec;
pub mod container;

pub use cache::{TableCache, TableSnapshot};
pub use container::{cleanup_temp_files, temp_path_for, write_container, TableContainer};
