//! Index cache: in-memory mirror of one table
//!
//! # Design
//!
//! - [`TableSnapshot`]: immutable rows in insertion order plus an id index
//!   and one index per unique column. Never modified after publication.
//! - [`TableCache`]: holds the current snapshot behind an `Arc`. Writers
//!   build a successor snapshot off to the side and swap it in; readers
//!   clone the `Arc` and keep a consistent view for as long as they hold it.
//!
//! # Thread Safety
//!
//! - `snapshot()`: takes the read lock only long enough to clone the `Arc`
//! - `publish()`: takes the write lock only long enough to swap the `Arc`
//!
//! Readers never wait on disk I/O and never see a half-applied mutation.
//! Serializing writers against each other is the concurrency layer's job.

use std::sync::Arc;

use clinicdb_core::{Row, TableSchema, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Immutable point-in-time view of a table
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    schema: &'static TableSchema,
    /// Rows in insertion order
    rows: Vec<Row>,
    /// id → position in `rows`
    by_id: FxHashMap<i64, usize>,
    /// One index per unique column: (column, value key → position)
    unique: Vec<(&'static str, FxHashMap<String, usize>)>,
    /// Largest id ever stored in this snapshot lineage
    max_id: i64,
}

impl TableSnapshot {
    /// Empty snapshot for a table
    pub fn empty(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            by_id: FxHashMap::default(),
            unique: schema
                .unique
                .iter()
                .map(|col| (*col, FxHashMap::default()))
                .collect(),
            max_id: 0,
        }
    }

    /// Build a snapshot from loaded rows
    ///
    /// Fails if two rows share an id or a unique value; the caller reports
    /// that as a corrupt container.
    pub fn build(schema: &'static TableSchema, rows: Vec<Row>) -> Result<Self, String> {
        let mut snapshot = Self::empty(schema);
        snapshot.rows.reserve(rows.len());
        for row in rows {
            if let Some(reason) = snapshot.conflict(&row, None) {
                return Err(reason);
            }
            snapshot.push(row);
        }
        Ok(snapshot)
    }

    /// Schema of the table
    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Iterate rows in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// O(1) lookup by primary key
    pub fn get(&self, id: i64) -> Option<&Row> {
        self.by_id.get(&id).map(|&pos| &self.rows[pos])
    }

    /// Check if a row with this id exists
    pub fn contains(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// O(1) lookup through a unique index
    ///
    /// Returns `None` for columns without a uniqueness constraint.
    pub fn find_unique(&self, column: &str, value: &Value) -> Option<&Row> {
        let key = value.index_key()?;
        self.unique
            .iter()
            .find(|(col, _)| *col == column)
            .and_then(|(_, index)| index.get(&key))
            .map(|&pos| &self.rows[pos])
    }

    /// Identifier the next created row receives
    pub fn next_id(&self) -> i64 {
        self.max_id + 1
    }

    /// First uniqueness conflict `row` would cause, as `(column, value)`
    ///
    /// `ignore_id` excludes the row being updated from the check.
    pub fn unique_conflict(&self, row: &Row, ignore_id: Option<i64>) -> Option<(&'static str, String)> {
        for (column, index) in &self.unique {
            let Some(key) = row.get(column).index_key() else {
                continue;
            };
            if let Some(&pos) = index.get(&key) {
                if Some(self.rows[pos].id()) != ignore_id {
                    return Some((*column, key));
                }
            }
        }
        None
    }

    /// Successor snapshot with `row` appended
    ///
    /// The caller has already assigned the id and checked constraints.
    pub fn with_inserted(&self, row: Row) -> Self {
        let mut next = self.clone();
        next.push(row);
        next
    }

    /// Successor snapshot with the row of the same id replaced
    ///
    /// Returns `None` if no row has that id.
    pub fn with_replaced(&self, row: Row) -> Option<Self> {
        let pos = *self.by_id.get(&row.id())?;
        let mut next = self.clone();
        let old = std::mem::replace(&mut next.rows[pos], row);
        for (column, index) in &mut next.unique {
            if let Some(key) = old.get(column).index_key() {
                index.remove(&key);
            }
            if let Some(key) = next.rows[pos].get(column).index_key() {
                index.insert(key, pos);
            }
        }
        Some(next)
    }

    fn conflict(&self, row: &Row, ignore_id: Option<i64>) -> Option<String> {
        if self.contains(row.id()) {
            return Some(format!("duplicate id {}", row.id()));
        }
        self.unique_conflict(row, ignore_id)
            .map(|(column, value)| format!("duplicate {} {:?}", column, value))
    }

    fn push(&mut self, row: Row) {
        let pos = self.rows.len();
        let id = row.id();
        for (column, index) in &mut self.unique {
            if let Some(key) = row.get(column).index_key() {
                index.insert(key, pos);
            }
        }
        self.by_id.insert(id, pos);
        self.max_id = self.max_id.max(id);
        self.rows.push(row);
    }
}

/// Current snapshot of one table, swapped atomically on every mutation
#[derive(Debug)]
pub struct TableCache {
    current: RwLock<Arc<TableSnapshot>>,
}

impl TableCache {
    /// Cache starting at `snapshot`
    pub fn new(snapshot: TableSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Empty cache for a table
    pub fn empty(schema: &'static TableSchema) -> Self {
        Self::new(TableSnapshot::empty(schema))
    }

    /// Current snapshot
    #[inline]
    pub fn snapshot(&self) -> Arc<TableSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Make `snapshot` the current view
    pub fn publish(&self, snapshot: TableSnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }
}
