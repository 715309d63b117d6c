//! Store configuration via `clinicdb.toml`
//!
//! On first open, a default `clinicdb.toml` is created in the data
//! directory. To change settings, edit the file and restart.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use clinicdb_core::{Error, Result, TableId};

/// Config file name placed in the store data directory.
pub const CONFIG_FILE_NAME: &str = "clinicdb.toml";

/// Store configuration loaded from `clinicdb.toml`.
///
/// # Example
///
/// ```toml
/// sync_writes = true
///
/// [tables]
/// cie10_codes = "cie10.jsonl"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// fsync containers and the data directory on every persist.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
    /// Container file name overrides, keyed by table name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, String>,
}

fn default_sync_writes() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sync_writes: default_sync_writes(),
            tables: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    /// Container file name for a table (override or `<table>.jsonl`).
    pub fn file_name(&self, table: TableId) -> String {
        self.tables
            .get(table.as_str())
            .cloned()
            .unwrap_or_else(|| table.default_file_name())
    }

    /// Check table names and file names.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown table name, a file name that is not a
    /// plain file name, or two tables sharing one file.
    pub fn validate(&self) -> Result<()> {
        for (name, file) in &self.tables {
            name.parse::<TableId>().map_err(Error::Config)?;
            let plain = Path::new(file)
                .file_name()
                .map(|f| f == file.as_str())
                .unwrap_or(false);
            if !plain || file.starts_with('.') {
                return Err(Error::Config(format!(
                    "table '{}': '{}' is not a plain file name",
                    name, file
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for table in TableId::ALL {
            let file = self.file_name(table);
            if file == CONFIG_FILE_NAME || !seen.insert(file.clone()) {
                return Err(Error::Config(format!(
                    "file name '{}' is used by more than one table",
                    file
                )));
            }
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# ClinicDB store configuration
#
# fsync every container write and its directory (default: true).
# Turning this off keeps writes atomic but may lose the latest writes
# on power loss.
sync_writes = true

# Container file name overrides. Defaults to "<table>.jsonl".
# [tables]
# users = "users.jsonl"
# cie10_codes = "cie10_codes.jsonl"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
