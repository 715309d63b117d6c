//! Store properties: behavior every caller of the store relies on.
//!
//! Each module covers one property family against a real data directory.

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod constraints;
mod export;
mod identifiers;
mod pagination;
mod persistence;
mod properties;
mod seeding;
mod workflow;
