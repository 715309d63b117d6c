//! Concurrency layer for ClinicDB
//!
//! This crate serializes mutations per table:
//! - TableSection: the exclusive token of one table, with outcome counters
//! - SectionGuard: proof of holding a section, required by mutation code
//! - ConcurrencyController: one section per table, independent across tables
//!
//! Reads never enter a section; they run against immutable snapshots
//! published by the storage layer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod section;

pub use controller::ConcurrencyController;
pub use section::{SectionGuard, SectionMetrics, TableSection};
