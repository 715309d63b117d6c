//! Exclusive sections
//!
//! A [`TableSection`] is the exclusive token of one table. Holding it is
//! the only way to run a mutation, so two mutations of the same table can
//! never interleave their read-validate-persist-publish sequences.
//!
//! The section also keeps observational counters. They use Relaxed
//! ordering: they synchronize nothing and approximate values are fine.

use std::sync::atomic::{AtomicU64, Ordering};

use clinicdb_core::{Result, TableId};
use parking_lot::{Mutex, MutexGuard};

/// Exclusive section token for one table
#[derive(Debug)]
pub struct TableSection {
    table: TableId,
    lock: Mutex<()>,
    committed: AtomicU64,
    aborted: AtomicU64,
}

impl TableSection {
    /// New, unlocked section
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            lock: Mutex::new(()),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Table this section guards
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Block until the section is free and take it
    pub fn enter(&self) -> SectionGuard<'_> {
        SectionGuard {
            table: self.table,
            _guard: self.lock.lock(),
        }
    }

    /// Run `f` inside the section and record its outcome
    pub fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SectionGuard<'_>) -> Result<T>,
    {
        let guard = self.enter();
        let result = f(&guard);
        drop(guard);
        match &result {
            Ok(_) => self.committed.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.aborted.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    /// Snapshot of the counters
    pub fn metrics(&self) -> SectionMetrics {
        SectionMetrics {
            table: self.table,
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

/// Proof that the holder is inside a table's exclusive section
///
/// Mutation code takes `&SectionGuard` so it cannot be called outside one.
#[derive(Debug)]
pub struct SectionGuard<'a> {
    table: TableId,
    _guard: MutexGuard<'a, ()>,
}

impl SectionGuard<'_> {
    /// Table whose section is held
    pub fn table(&self) -> TableId {
        self.table
    }
}

/// Mutation counters for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMetrics {
    /// Table the counters belong to
    pub table: TableId,
    /// Mutations that completed successfully
    pub committed: u64,
    /// Mutations that returned an error
    pub aborted: u64,
}
