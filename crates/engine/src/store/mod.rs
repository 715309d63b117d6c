//! Store: the row-level facade over every table
//!
//! A `Store` owns, per table, the on-disk container, the published cache
//! and the load status, plus the concurrency controller that serializes
//! mutations. It is built once at startup and shared through `Arc`.
//!
//! # Open sequence
//!
//! 1. Create the data directory and read (or write) `clinicdb.toml`
//! 2. Take the exclusive `.lock` file so a second process fails fast
//! 3. Remove temporaries left by an interrupted persist
//! 4. Load every container into its cache
//!
//! A corrupt container does not fail the open. Its cache starts empty, the
//! problem is logged and listed in [`Store::load_report`], and writes to
//! that table are refused until it is reset.

mod config;
mod mutation;

pub use config::{StoreConfig, CONFIG_FILE_NAME};

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clinicdb_concurrency::{ConcurrencyController, SectionMetrics};
use clinicdb_core::{Error, Result, Row, TableId, Value};
use clinicdb_storage::{
    cleanup_temp_files, temp_path_for, TableCache, TableContainer, TableSnapshot,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::query::{self, Filter, Page};

/// Name of the advisory lock file in the data directory
pub const LOCK_FILE_NAME: &str = ".lock";

/// Storage state of one table
#[derive(Debug)]
pub(crate) struct StoredTable {
    pub(crate) container: TableContainer,
    pub(crate) cache: TableCache,
    /// Why the container failed to load, if it did
    pub(crate) load_error: RwLock<Option<String>>,
}

impl StoredTable {
    fn open(container: TableContainer) -> Result<Self> {
        let schema = container.schema();
        let (cache, load_error) = match container.load() {
            Ok(rows) => match TableSnapshot::build(schema, rows) {
                Ok(snapshot) => (TableCache::new(snapshot), None),
                Err(reason) => (TableCache::empty(schema), Some(reason)),
            },
            Err(Error::CorruptContainer { reason, .. }) => (TableCache::empty(schema), Some(reason)),
            Err(e) => return Err(e),
        };
        if let Some(reason) = &load_error {
            error!(
                target: "clinicdb::store",
                table = %schema.table,
                path = %container.path().display(),
                reason = %reason,
                "Container is corrupt; table starts empty and refuses writes until reset"
            );
        }
        Ok(Self {
            container,
            cache,
            load_error: RwLock::new(load_error),
        })
    }

    /// Refuse writes while the on-disk container is unreadable
    pub(crate) fn ensure_writable(&self) -> Result<()> {
        match &*self.load_error.read() {
            Some(reason) => Err(Error::corrupt(self.container.path(), reason.clone())),
            None => Ok(()),
        }
    }
}

/// Load status of one table, as reported by [`Store::load_report`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    /// Table
    pub table: TableId,
    /// Container path
    pub path: PathBuf,
    /// Rows currently cached
    pub rows: usize,
    /// Load failure, if the container was corrupt at open
    pub error: Option<String>,
}

impl TableStatus {
    /// Whether the table loaded cleanly
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Persistent, thread-safe store of every clinic table
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    config: StoreConfig,
    tables: FxHashMap<TableId, StoredTable>,
    controller: ConcurrencyController,
    /// Held for the store's lifetime; dropping it releases the lock
    _lock_file: File,
}

impl Store {
    // ========================================================================
    // Open
    // ========================================================================

    /// Open (or create) a store in `data_dir`
    ///
    /// Reads `clinicdb.toml`, writing the commented default first if it
    /// does not exist.
    ///
    /// # Errors
    ///
    /// `Config` for an unreadable config file, `Io` if the directory cannot
    /// be created, is locked by another process, or a container cannot be
    /// read.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Arc<Self>> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let lock_file = acquire_lock(data_dir)?;
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&config_path)?;
        let config = StoreConfig::from_file(&config_path)?;
        Self::open_locked(data_dir, config, lock_file)
    }

    /// Open a store with an explicit config, writing it to `clinicdb.toml`
    ///
    /// The config file is only written once the directory lock is held.
    pub fn open_with_config<P: AsRef<Path>>(data_dir: P, config: StoreConfig) -> Result<Arc<Self>> {
        let data_dir = data_dir.as_ref();
        config.validate()?;
        std::fs::create_dir_all(data_dir)?;
        let lock_file = acquire_lock(data_dir)?;
        config.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;
        Self::open_locked(data_dir, config, lock_file)
    }

    fn open_locked(data_dir: &Path, config: StoreConfig, lock_file: File) -> Result<Arc<Self>> {
        match cleanup_temp_files(data_dir) {
            Ok(0) => {}
            Ok(removed) => warn!(
                target: "clinicdb::store",
                removed,
                "Removed temporary files left by an interrupted write"
            ),
            Err(e) => warn!(target: "clinicdb::store", error = %e, "Temporary file cleanup failed"),
        }

        let mut tables = FxHashMap::default();
        for table in TableId::ALL {
            let container = TableContainer::new(data_dir.join(config.file_name(table)), table.schema())
                .with_sync(config.sync_writes);
            tables.insert(table, StoredTable::open(container)?);
        }

        let store = Self {
            data_dir: data_dir.to_path_buf(),
            config,
            tables,
            controller: ConcurrencyController::new(),
            _lock_file: lock_file,
        };

        let corrupt = store.load_report().iter().filter(|s| !s.is_healthy()).count();
        info!(
            target: "clinicdb::store",
            path = %store.data_dir.display(),
            rows = store.tables.values().map(|t| t.cache.snapshot().len()).sum::<usize>(),
            corrupt_tables = corrupt,
            sync_writes = store.config.sync_writes,
            "Store opened"
        );
        Ok(Arc::new(store))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Effective configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Container path of a table
    pub fn table_path(&self, table: TableId) -> &Path {
        self.stored(table).container.path()
    }

    /// Whether `path` names one of the store's own files
    ///
    /// Covers every table container and its temporary sibling, the config
    /// file and the lock file. Relative paths and symlinks are resolved
    /// before comparing.
    pub fn owns_path(&self, path: &Path) -> Result<bool> {
        let target = resolve_target(path)?;
        let data_dir = std::fs::canonicalize(&self.data_dir)?;
        if target.parent() != Some(data_dir.as_path()) {
            return Ok(false);
        }
        let mut owned = vec![data_dir.join(CONFIG_FILE_NAME), data_dir.join(LOCK_FILE_NAME)];
        for table in TableId::ALL {
            let container = data_dir.join(self.config.file_name(table));
            owned.push(temp_path_for(&container));
            owned.push(container);
        }
        Ok(owned.contains(&target))
    }

    pub(crate) fn stored(&self, table: TableId) -> &StoredTable {
        // Every TableId is inserted at open.
        &self.tables[&table]
    }

    pub(crate) fn controller(&self) -> &ConcurrencyController {
        &self.controller
    }

    /// Current published snapshot of a table
    pub fn snapshot(&self, table: TableId) -> Arc<TableSnapshot> {
        self.stored(table).cache.snapshot()
    }

    /// Number of rows in a table
    pub fn count(&self, table: TableId) -> usize {
        self.snapshot(table).len()
    }

    /// Load status of every table, in dependency order
    pub fn load_report(&self) -> Vec<TableStatus> {
        TableId::ALL
            .iter()
            .map(|&table| {
                let stored = self.stored(table);
                TableStatus {
                    table,
                    path: stored.container.path().to_path_buf(),
                    rows: stored.cache.snapshot().len(),
                    error: stored.load_error.read().clone(),
                }
            })
            .collect()
    }

    /// Mutation counters of every table
    pub fn metrics(&self) -> Vec<SectionMetrics> {
        self.controller.all_metrics()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Row by primary key
    ///
    /// # Errors
    ///
    /// `NotFound` if no row has that id.
    pub fn get(&self, table: TableId, id: i64) -> Result<Row> {
        self.snapshot(table)
            .get(id)
            .cloned()
            .ok_or(Error::NotFound { table, id })
    }

    /// One page of the rows selected by `filter`, in insertion order
    pub fn get_all(&self, table: TableId, page: usize, limit: usize, filter: &Filter) -> Result<Page<Row>> {
        let snapshot = self.snapshot(table);
        let rows = query::filter_rows(&snapshot, filter)?;
        query::paginate(rows, page, limit)?.try_map(|row| Ok(row.clone()))
    }

    /// Case-insensitive substring search over the table's search columns
    pub fn search(&self, table: TableId, query: &str, limit: usize) -> Result<Vec<Row>> {
        let snapshot = self.snapshot(table);
        Ok(query::search_rows(&snapshot, query, limit)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Row whose unique `column` equals `value`
    ///
    /// # Errors
    ///
    /// `Validation` if `column` carries no uniqueness constraint.
    pub fn find_unique(&self, table: TableId, column: &str, value: &Value) -> Result<Option<Row>> {
        let snapshot = self.snapshot(table);
        if !snapshot.schema().is_unique(column) {
            return Err(Error::validation(format!(
                "{}.{} is not a unique column",
                table, column
            )));
        }
        Ok(snapshot.find_unique(column, value).cloned())
    }

    /// Every row selected by `filter`, unpaginated
    pub fn export_selection(&self, table: TableId, filter: &Filter) -> Result<Vec<Row>> {
        let snapshot = self.snapshot(table);
        Ok(query::filter_rows(&snapshot, filter)?
            .into_iter()
            .cloned()
            .collect())
    }
}

/// Canonical form of a path that may not exist yet
fn resolve_target(path: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let name = path.file_name().ok_or_else(|| {
                Error::validation(format!("'{}' does not name a file", path.display()))
            })?;
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            Ok(std::fs::canonicalize(parent)?.join(name))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

fn acquire_lock(data_dir: &Path) -> Result<File> {
    let lock_path = data_dir.join(LOCK_FILE_NAME);
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&lock_path)?;
    fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            format!(
                "store at '{}' is already in use by another process",
                data_dir.display()
            ),
        ))
    })?;
    Ok(lock_file)
}
