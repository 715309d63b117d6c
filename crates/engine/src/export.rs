//! Snapshot exporter
//!
//! Writes a selection of one table into a new, standalone container at a
//! caller-chosen path. The export uses the table's header layout and the
//! same temp-write → fsync → rename discipline as a persist, so a reader of
//! the export file never sees it half written. The source table is only
//! read, through its published snapshot.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use clinicdb_core::{Error, Result, TableId};
use clinicdb_storage::write_container;

use crate::query::{self, Filter};
use crate::store::Store;

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Table exported
    pub table: TableId,
    /// File written
    pub path: PathBuf,
    /// Data rows written (header excluded)
    pub rows: usize,
}

impl Store {
    /// Export the rows selected by `filter` into a new container at `path`
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid filter or a `path` that is one of the
    /// store's own files; `Io` if the file cannot be written. Nothing is
    /// retried.
    pub fn export_to(&self, table: TableId, filter: &Filter, path: impl AsRef<Path>) -> Result<ExportReport> {
        let path = path.as_ref();
        if self.owns_path(path)? {
            return Err(Error::validation(format!(
                "export path '{}' is a file of the store itself",
                path.display()
            )));
        }
        let snapshot = self.snapshot(table);
        let rows: Vec<_> = query::filter_rows(&snapshot, filter)?
            .into_iter()
            .cloned()
            .collect();
        write_container(path, snapshot.schema(), &rows, self.config().sync_writes)?;

        let (from, to) = filter.date_range();
        info!(
            target: "clinicdb::export",
            table = %table,
            path = %path.display(),
            rows = rows.len(),
            from = ?from,
            to = ?to,
            "Export written"
        );
        Ok(ExportReport {
            table,
            path: path.to_path_buf(),
            rows: rows.len(),
        })
    }
}
