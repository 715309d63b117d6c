//! Mutations: create, update and reset
//!
//! Each mutation runs inside its table's section for the whole
//! snapshot → validate → successor → persist → publish sequence. A rejected
//! or failed mutation returns before publish, so the cache and the
//! container keep their previous content.
//!
//! Foreign keys are checked against the target tables' published
//! snapshots. No second section is ever taken.

use chrono::Datelike;
use tracing::{debug, info, warn};

use clinicdb_concurrency::SectionGuard;
use clinicdb_core::{Changes, Error, Result, Row, TableId, Value};
use clinicdb_storage::TableSnapshot;

use super::Store;
use crate::seed::SeedOutcome;

impl Store {
    /// Insert a row, assigning the next id and computing derived columns
    ///
    /// Any id or derived value already in `row` is overwritten.
    ///
    /// # Errors
    ///
    /// `Validation` for a cell that violates its column, `DuplicateKey` for
    /// a taken unique value, `ReferentialIntegrity` for a dangling foreign
    /// key, `CorruptContainer` if the table failed to load, `Io` if the
    /// container cannot be written.
    pub fn create(&self, row: Row) -> Result<Row> {
        match self.insert(row, None)? {
            SeedOutcome::Created(row) | SeedOutcome::Skipped(row) => Ok(row),
        }
    }

    /// Insert a row unless one with the same unique `column` value exists
    ///
    /// The existence check and the insert happen in one critical section, so
    /// concurrent seeders never both create the same key.
    pub fn create_or_skip(&self, row: Row, column: &str) -> Result<SeedOutcome<Row>> {
        if !row.schema().is_unique(column) {
            return Err(Error::validation(format!(
                "{}.{} is not a unique column",
                row.table(),
                column
            )));
        }
        self.insert(row, Some(column))
    }

    fn insert(&self, mut row: Row, skip_existing: Option<&str>) -> Result<SeedOutcome<Row>> {
        let table = row.table();
        let stored = self.stored(table);
        self.controller().mutate(table, |guard| {
            debug_assert_eq!(guard.table(), table);
            stored.ensure_writable()?;
            let snapshot = stored.cache.snapshot();

            if let Some(column) = skip_existing {
                if let Some(existing) = snapshot.find_unique(column, row.get(column)) {
                    return Ok(SeedOutcome::Skipped(existing.clone()));
                }
            }

            row.set_id(snapshot.next_id());
            derive_columns(&mut row, &snapshot)?;
            row.validate()?;
            if let Some((column, value)) = snapshot.unique_conflict(&row, None) {
                return Err(Error::DuplicateKey {
                    table,
                    column,
                    value,
                });
            }
            self.check_foreign_keys(&row)?;

            let successor = snapshot.with_inserted(row.clone());
            stored.container.persist(successor.rows())?;
            stored.cache.publish(successor);
            debug!(target: "clinicdb::store", table = %table, id = row.id(), "Row created");
            Ok(SeedOutcome::Created(row))
        })
    }

    /// Overwrite some columns of an existing row
    ///
    /// Re-supplying the current value of an immutable column (the id, a
    /// foreign key, a derived column) is accepted; changing it is not.
    /// An update that changes nothing does not touch the container.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing id, `Validation` for an unknown or immutable
    /// column or an invalid value, `DuplicateKey` if a changed unique value
    /// is taken by another row, `CorruptContainer` or `Io` as for `create`.
    pub fn update(&self, table: TableId, id: i64, changes: &Changes) -> Result<Row> {
        let stored = self.stored(table);
        self.controller().mutate(table, |_guard| {
            stored.ensure_writable()?;
            let snapshot = stored.cache.snapshot();
            let current = snapshot.get(id).ok_or(Error::NotFound { table, id })?;
            let schema = current.schema();

            let mut next = current.clone();
            for (column, value) in changes.iter() {
                if schema.column(column).is_none() {
                    return Err(Error::validation(format!(
                        "{} has no column '{}'",
                        table, column
                    )));
                }
                if schema.is_immutable(column) && current.get(column) != value {
                    return Err(Error::validation(format!(
                        "{}.{} cannot be changed",
                        table, column
                    )));
                }
                next.set(column, value.clone())?;
            }
            if next == *current {
                return Ok(next);
            }

            next.validate()?;
            if let Some((column, value)) = snapshot.unique_conflict(&next, Some(id)) {
                return Err(Error::DuplicateKey {
                    table,
                    column,
                    value,
                });
            }

            let successor = snapshot
                .with_replaced(next.clone())
                .ok_or(Error::NotFound { table, id })?;
            stored.container.persist(successor.rows())?;
            stored.cache.publish(successor);
            debug!(target: "clinicdb::store", table = %table, id, "Row updated");
            Ok(next)
        })
    }

    /// Replace a table with an empty, header-only container
    ///
    /// Ids restart at 1. Also the way out of a corrupt-container state.
    ///
    /// This is a bootstrap and maintenance operation. Rows of other tables
    /// that reference the reset table are kept, and their foreign keys will
    /// point at whatever rows later reuse those ids. A create on a dependent
    /// table that already passed its foreign-key check may also land just
    /// after the reset. Use [`Store::reset_all`] to clear a referenced table
    /// together with its dependents.
    pub fn reset(&self, table: TableId) -> Result<()> {
        let stored = self.stored(table);
        let dependents = self.populated_dependents(table);
        if !dependents.is_empty() {
            warn!(
                target: "clinicdb::store",
                table = %table,
                dependents = ?dependents,
                "Resetting a table that other rows still reference"
            );
        }
        self.controller().mutate(table, |guard| {
            reset_locked(self, guard)?;
            stored.load_error.write().take();
            info!(
                target: "clinicdb::store",
                table = %table,
                path = %stored.container.path().display(),
                "Table reset"
            );
            Ok(())
        })
    }

    /// Reset every table, dependents first
    pub fn reset_all(&self) -> Result<()> {
        for table in TableId::ALL.iter().rev() {
            self.reset(*table)?;
        }
        Ok(())
    }

    /// Non-empty tables with a foreign key into `table`
    fn populated_dependents(&self, table: TableId) -> Vec<TableId> {
        TableId::ALL
            .iter()
            .copied()
            .filter(|dependent| {
                dependent
                    .schema()
                    .foreign_keys
                    .iter()
                    .any(|fk| fk.target == table)
            })
            .filter(|&dependent| self.count(dependent) > 0)
            .collect()
    }

    fn check_foreign_keys(&self, row: &Row) -> Result<()> {
        for fk in row.schema().foreign_keys {
            let id = row.int(fk.column)?;
            if !self.snapshot(fk.target).contains(id) {
                return Err(Error::ReferentialIntegrity {
                    table: row.table(),
                    column: fk.column,
                    target: fk.target,
                    id,
                });
            }
        }
        Ok(())
    }
}

fn reset_locked(store: &Store, guard: &SectionGuard<'_>) -> Result<()> {
    let stored = store.stored(guard.table());
    stored.container.reset()?;
    stored
        .cache
        .publish(TableSnapshot::empty(stored.container.schema()));
    Ok(())
}

/// Fill in the columns the store computes at create time
fn derive_columns(row: &mut Row, snapshot: &TableSnapshot) -> Result<()> {
    match row.table() {
        TableId::MedicalRecords => {
            let patient_id = row.int("patient_id")?;
            let date = row.date("date")?;
            let (mut monthly, mut annual) = (1i64, 1i64);
            for existing in snapshot.iter() {
                if existing.get("patient_id").as_int() != Some(patient_id) {
                    continue;
                }
                let Some(seen) = existing.get("date").as_date() else {
                    continue;
                };
                if seen.year() == date.year() {
                    annual += 1;
                    if seen.month() == date.month() {
                        monthly += 1;
                    }
                }
            }
            row.set("monthly_count", monthly)?;
            row.set("annual_count", annual)?;
        }
        TableId::Certificates => {
            let start = row.date("start_date")?;
            let end = row.date("end_date")?;
            if end < start {
                return Err(Error::validation(format!(
                    "certificate end_date {} is before start_date {}",
                    end, start
                )));
            }
            row.set("valid_days", Value::Int((end - start).num_days() + 1))?;
        }
        _ => {}
    }
    Ok(())
}
