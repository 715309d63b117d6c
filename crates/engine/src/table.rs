//! Table<E>: typed access to one entity table
//!
//! ## Design
//!
//! `Table<E>` is a stateless facade over the store. It holds nothing but
//! an `Arc<Store>`; every call converts between `E` and [`Row`] and
//! delegates. Several `Table` handles over one store are safe to use from
//! any number of threads.
//!
//! ## API
//!
//! - `create(new)` - insert, returning the stored entity with its id
//! - `get_by_id(id)` - O(1) lookup
//! - `get_all(page, limit, filter)` - filtered, paginated listing
//! - `update(id, changes)` - partial update
//! - `search(query, limit)` - free-text search
//! - `export_selection(start, end)` - rows within a date range
//! - `reset()` - empty the table

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use clinicdb_core::{Changes, Entity, Result, Row, TableId, Value};

use crate::export::ExportReport;
use crate::query::{Filter, Page};
use crate::seed::SeedOutcome;
use crate::store::Store;

/// Typed handle to the table of entity `E`
///
/// # Example
///
/// ```ignore
/// let store = Store::open("/var/lib/clinic")?;
/// let patients: Table<Patient> = Table::new(store);
/// let p = patients.create(NewPatient { identification: "0912".into(), ..Default::default() })?;
/// let again = patients.get_by_id(p.id)?;
/// ```
pub struct Table<E: Entity> {
    store: Arc<Store>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.store))
    }
}

impl<E: Entity> std::fmt::Debug for Table<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("table", &E::TABLE).finish()
    }
}

impl<E: Entity> Table<E> {
    /// Create a typed handle over `store`
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Table this handle addresses
    pub fn id(&self) -> TableId {
        E::TABLE
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    // ========== Writes ==========

    /// Insert a new entity
    pub fn create(&self, new: E::New) -> Result<E> {
        let row = self.store.create(E::new_row(new))?;
        debug!(target: "clinicdb::table", table = %E::TABLE, id = row.id(), "Entity created");
        E::from_row(&row)
    }

    /// Insert unless an entity with the same unique `column` value exists
    pub fn create_or_skip(&self, new: E::New, column: &str) -> Result<SeedOutcome<E>> {
        self.store
            .create_or_skip(E::new_row(new), column)?
            .try_map(|row| E::from_row(&row))
    }

    /// Overwrite some fields of an existing entity
    pub fn update(&self, id: i64, changes: &Changes) -> Result<E> {
        E::from_row(&self.store.update(E::TABLE, id, changes)?)
    }

    /// Empty the table; ids restart at 1
    pub fn reset(&self) -> Result<()> {
        self.store.reset(E::TABLE)
    }

    // ========== Reads ==========

    /// Entity by primary key
    pub fn get_by_id(&self, id: i64) -> Result<E> {
        E::from_row(&self.store.get(E::TABLE, id)?)
    }

    /// One page of the entities selected by `filter`
    pub fn get_all(&self, page: usize, limit: usize, filter: &Filter) -> Result<Page<E>> {
        self.store
            .get_all(E::TABLE, page, limit, filter)?
            .try_map(|row| E::from_row(&row))
    }

    /// Case-insensitive substring search, at most `limit` results
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<E>> {
        decode(self.store.search(E::TABLE, query, limit)?)
    }

    /// Entity whose unique `column` equals `value`
    pub fn find_unique(&self, column: &str, value: impl Into<Value>) -> Result<Option<E>> {
        self.store
            .find_unique(E::TABLE, column, &value.into())?
            .map(|row| E::from_row(&row))
            .transpose()
    }

    /// Entities dated within `[start, end]`, unpaginated
    pub fn export_selection(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<E>> {
        decode(
            self.store
                .export_selection(E::TABLE, &Filter::new().between(start, end))?,
        )
    }

    /// Write the entities dated within `[start, end]` to a new container
    pub fn export_to(&self, start: NaiveDate, end: NaiveDate, path: impl AsRef<Path>) -> Result<ExportReport> {
        self.store
            .export_to(E::TABLE, &Filter::new().between(start, end), path)
    }

    /// Number of stored entities
    pub fn count(&self) -> usize {
        self.store.count(E::TABLE)
    }
}

fn decode<E: Entity>(rows: Vec<Row>) -> Result<Vec<E>> {
    rows.iter().map(E::from_row).collect()
}
