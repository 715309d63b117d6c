//! Rows and field changes
//!
//! A [`Row`] is the schema-aware, untyped form of an entity: one [`Value`]
//! per column in declared order. It is the unit the storage layer persists
//! and the cache indexes. Typed entities (see [`crate::entities`]) convert
//! to and from rows at the facade boundary.

use std::fmt;

use crate::error::{Error, Result};
use crate::schema::{TableId, TableSchema, PRIMARY_KEY};
use crate::value::Value;

/// One row of a table
#[derive(Clone)]
pub struct Row {
    schema: &'static TableSchema,
    cells: Vec<Value>,
}

impl Row {
    /// Build a row from cells in declared column order
    ///
    /// Fails if the cell count does not match the column count. Cell types
    /// are not checked here; see [`Row::validate`].
    pub fn from_cells(schema: &'static TableSchema, cells: Vec<Value>) -> Result<Self> {
        if cells.len() != schema.columns.len() {
            return Err(Error::validation(format!(
                "{} expects {} columns, got {}",
                schema.table,
                schema.columns.len(),
                cells.len()
            )));
        }
        Ok(Row { schema, cells })
    }

    /// Build a row whose width is known to match the schema
    pub(crate) fn from_cells_unchecked(schema: &'static TableSchema, cells: Vec<Value>) -> Self {
        debug_assert_eq!(cells.len(), schema.columns.len(), "{}", schema.table);
        Row { schema, cells }
    }

    /// Build a row from `(column, value)` pairs
    ///
    /// Columns not mentioned are `Null`. Unknown columns are rejected.
    pub fn from_pairs<I, K>(schema: &'static TableSchema, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut cells = vec![Value::Null; schema.columns.len()];
        for (name, value) in pairs {
            let name = name.as_ref();
            let idx = schema.column_index(name).ok_or_else(|| {
                Error::validation(format!("{} has no column '{}'", schema.table, name))
            })?;
            cells[idx] = value;
        }
        Ok(Row { schema, cells })
    }

    /// Table this row belongs to
    pub fn table(&self) -> TableId {
        self.schema.table
    }

    /// Schema of the owning table
    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// Primary key, or 0 if not yet assigned
    pub fn id(&self) -> i64 {
        self.cells[0].as_int().unwrap_or(0)
    }

    /// Cells in declared column order
    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    /// Consume the row, returning its cells
    pub fn into_cells(self) -> Vec<Value> {
        self.cells
    }

    /// Value of a named column (`Null` for unknown columns)
    pub fn get(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        match self.schema.column_index(column) {
            Some(idx) => &self.cells[idx],
            None => &NULL,
        }
    }

    /// Set a named column
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let idx = self.schema.column_index(column).ok_or_else(|| {
            Error::validation(format!("{} has no column '{}'", self.schema.table, column))
        })?;
        self.cells[idx] = value.into();
        Ok(())
    }

    /// Assign the primary key
    pub fn set_id(&mut self, id: i64) {
        self.cells[0] = Value::Int(id);
    }

    /// Check every cell against its column definition
    pub fn validate(&self) -> Result<()> {
        for (column, value) in self.schema.columns.iter().zip(&self.cells) {
            if column.name == PRIMARY_KEY {
                continue;
            }
            column
                .check(value)
                .map_err(|reason| Error::validation(format!("{}: {}", self.schema.table, reason)))?;
        }
        Ok(())
    }

    // ========== Typed accessors used by entity conversions ==========

    /// Required integer column
    pub fn int(&self, column: &str) -> Result<i64> {
        self.get(column)
            .as_int()
            .ok_or_else(|| self.type_error(column, "integer"))
    }

    /// Required boolean column
    pub fn boolean(&self, column: &str) -> Result<bool> {
        self.get(column)
            .as_bool()
            .ok_or_else(|| self.type_error(column, "boolean"))
    }

    /// Required text column
    pub fn text(&self, column: &str) -> Result<String> {
        self.get(column)
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| self.type_error(column, "string"))
    }

    /// Optional text column
    pub fn opt_text(&self, column: &str) -> Option<String> {
        self.get(column).as_text().map(str::to_string)
    }

    /// Required date column
    pub fn date(&self, column: &str) -> Result<chrono::NaiveDate> {
        self.get(column)
            .as_date()
            .ok_or_else(|| self.type_error(column, "date"))
    }

    /// Optional date column
    pub fn opt_date(&self, column: &str) -> Option<chrono::NaiveDate> {
        self.get(column).as_date()
    }

    fn type_error(&self, column: &str, expected: &str) -> Error {
        Error::validation(format!(
            "{}.{} is not a {} (found {})",
            self.schema.table,
            column,
            expected,
            self.get(column).type_name()
        ))
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.schema.table == other.schema.table && self.cells == other.cells
    }
}

impl Eq for Row {}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (column, value) in self.schema.columns.iter().zip(&self.cells) {
            map.entry(&column.name, value);
        }
        map.finish()
    }
}

/// A partial update: the columns to overwrite and their new values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    fields: Vec<(String, Value)>,
}

impl Changes {
    /// Empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column (builder style); later writes to the same column win
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column in place
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Whether nothing is changed
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(column, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }
}
