//! Table container: durable storage of one table's full row set
//!
//! Every persist rewrites the whole table. Writes follow the
//! write-fsync-rename pattern:
//!
//! 1. Write header and rows to a temporary sibling (`.<name>.tmp`)
//! 2. fsync the temporary file
//! 3. Atomic rename over the container
//! 4. fsync the parent directory
//!
//! Either the new content is complete on disk or the old content is
//! untouched; a later `load` never observes a partially written file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clinicdb_core::{Error, Result, Row, TableSchema};
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::codec;

/// Suffix of temporary files written during persist
pub const TEMP_SUFFIX: &str = ".tmp";

/// On-disk container for one table
#[derive(Debug, Clone)]
pub struct TableContainer {
    path: PathBuf,
    schema: &'static TableSchema,
    sync: bool,
}

impl TableContainer {
    /// Create a container handle (no I/O)
    pub fn new(path: impl Into<PathBuf>, schema: &'static TableSchema) -> Self {
        Self {
            path: path.into(),
            schema,
            sync: true,
        }
    }

    /// Enable or disable fsync on persist
    ///
    /// Without fsync the rename still keeps readers from seeing partial
    /// files, but a power loss may lose the last writes.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Container path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema of the stored table
    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// Whether the container file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every row in stored order
    ///
    /// A missing container is first-run bootstrap: a header-only container
    /// is written and an empty sequence returned.
    ///
    /// # Errors
    ///
    /// `CorruptContainer` when the header does not match the schema, a line
    /// does not decode, a cell violates its column definition, or an id is
    /// missing, non-positive or repeated.
    pub fn load(&self) -> Result<Vec<Row>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    target: "clinicdb::storage",
                    table = %self.schema.table,
                    path = %self.path.display(),
                    "Container missing, creating header-only container"
                );
                self.persist(&[])?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut lines = BufReader::new(file).lines();
        let header = match lines.next() {
            Some(line) => self.read_line(line, 1)?,
            None => return Err(self.corrupt("missing header line")),
        };
        let columns = codec::decode_header(&header).map_err(|e| self.corrupt(e))?;
        let expected = self.schema.header();
        if columns != expected {
            return Err(self.corrupt(format!(
                "header {:?} does not match expected columns {:?}",
                columns, expected
            )));
        }

        let mut rows = Vec::new();
        let mut seen = FxHashSet::default();
        for (idx, line) in lines.enumerate() {
            // Line numbers are 1-based and the header is line 1.
            let line_no = idx + 2;
            let line = self.read_line(line, line_no)?;
            if line.trim().is_empty() {
                continue;
            }
            let row = codec::decode_row(self.schema, &line)
                .map_err(|e| self.corrupt(format!("line {}: {}", line_no, e)))?;
            row.validate()
                .map_err(|e| self.corrupt(format!("line {}: {}", line_no, e)))?;
            let id = row.get(self.schema.primary_key()).as_int().unwrap_or(0);
            if id < 1 {
                return Err(self.corrupt(format!("line {}: invalid id {}", line_no, id)));
            }
            if !seen.insert(id) {
                return Err(self.corrupt(format!("line {}: duplicate id {}", line_no, id)));
            }
            rows.push(row);
        }

        debug!(
            target: "clinicdb::storage",
            table = %self.schema.table,
            rows = rows.len(),
            "Container loaded"
        );
        Ok(rows)
    }

    /// Atomically replace the container with `rows`
    pub fn persist(&self, rows: &[Row]) -> Result<()> {
        write_container(&self.path, self.schema, rows, self.sync)
    }

    /// Atomically replace the container with a header-only one
    pub fn reset(&self) -> Result<()> {
        self.persist(&[])?;
        info!(
            target: "clinicdb::storage",
            table = %self.schema.table,
            path = %self.path.display(),
            "Container reset"
        );
        Ok(())
    }

    fn corrupt(&self, reason: impl Into<String>) -> Error {
        Error::corrupt(&self.path, reason)
    }

    fn read_line(&self, line: io::Result<String>, line_no: usize) -> Result<String> {
        line.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => self.corrupt(format!("line {}: invalid UTF-8", line_no)),
            _ => Error::Io(e),
        })
    }
}

/// Path of the temporary sibling used while writing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}{}", name, TEMP_SUFFIX))
}

/// Write a complete container (header plus rows) to `path` atomically
///
/// Used for both table persistence and snapshot export. On failure the
/// temporary file is removed and any existing file at `path` is untouched.
pub fn write_container(
    path: &Path,
    schema: &TableSchema,
    rows: &[Row],
    sync: bool,
) -> Result<()> {
    let temp_path = temp_path_for(path);
    match write_temp_then_rename(path, &temp_path, schema, rows, sync) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(
                        target: "clinicdb::storage",
                        path = %temp_path.display(),
                        error = %cleanup,
                        "Failed to remove temporary container"
                    );
                }
            }
            Err(Error::Io(e))
        }
    }
}

fn write_temp_then_rename(
    path: &Path,
    temp_path: &Path,
    schema: &TableSchema,
    rows: &[Row],
    sync: bool,
) -> io::Result<()> {
    // Step 1: Write to temporary file
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(temp_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(codec::encode_header(schema).as_bytes())?;
    writer.write_all(b"\n")?;
    for row in rows {
        writer.write_all(codec::encode_row(row).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    let file = writer.into_inner().map_err(|e| e.into_error())?;

    // Step 2: fsync the file
    if sync {
        file.sync_all()?;
    }
    drop(file);

    // Step 3: Atomic rename
    fs::rename(temp_path, path)?;

    // Step 4: fsync parent directory
    if sync {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            File::open(parent)?.sync_all()?;
        }
    }
    Ok(())
}

/// Remove temporary container files left behind by a crash
///
/// Called when a store opens, before any table is loaded.
pub fn cleanup_temp_files(dir: &Path) -> io::Result<usize> {
    let mut count = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') && name.ends_with(TEMP_SUFFIX) {
            fs::remove_file(entry.path())?;
            count += 1;
        }
    }

    Ok(count)
}
