//! Schema registry
//!
//! Static description of every entity table: ordered columns with their
//! semantic type, the primary key, uniqueness constraints, foreign-key
//! references, the date column used for range filters and the text columns
//! used for free-text search.
//!
//! The registry is pure data. Every schema is a `'static` value, so lookups
//! never allocate and never fail.
//!
//! ## Layout rules
//!
//! - Column 0 is always the primary key [`PRIMARY_KEY`] (`Integer`, required)
//! - Container headers list the columns in declared order
//! - Foreign keys always point at the primary key of the target table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// Name of the primary-key column shared by every table
pub const PRIMARY_KEY: &str = "id";

/// Valid values of the `role` column on users
pub const USER_ROLES: &[&str] = &["admin", "doctor", "reader"];

// ============================================================================
// Table identifiers
// ============================================================================

/// Identifies one entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableId {
    /// User accounts
    Users,
    /// CIE10 diagnostic codes
    Cie10Codes,
    /// Patients (workers)
    Patients,
    /// Consultations
    MedicalRecords,
    /// Workplace incidents
    Incidents,
    /// Antidoping tests
    AntidopingRecords,
    /// Medical leave certificates
    Certificates,
}

impl TableId {
    /// All tables, in dependency order (referenced tables first)
    pub const ALL: [TableId; 7] = [
        TableId::Users,
        TableId::Cie10Codes,
        TableId::Patients,
        TableId::MedicalRecords,
        TableId::Incidents,
        TableId::AntidopingRecords,
        TableId::Certificates,
    ];

    /// Stable snake_case table name
    pub fn as_str(&self) -> &'static str {
        match self {
            TableId::Users => "users",
            TableId::Cie10Codes => "cie10_codes",
            TableId::Patients => "patients",
            TableId::MedicalRecords => "medical_records",
            TableId::Incidents => "incidents",
            TableId::AntidopingRecords => "antidoping_records",
            TableId::Certificates => "certificates",
        }
    }

    /// Default container file name inside the data directory
    pub fn default_file_name(&self) -> String {
        format!("{}.jsonl", self.as_str())
    }

    /// Schema for this table
    pub fn schema(&self) -> &'static TableSchema {
        schema(*self)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TableId::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown table '{}'", s))
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Semantic column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit integer
    Integer,
    /// Free text
    Text,
    /// Boolean flag
    Boolean,
    /// Calendar date (`YYYY-MM-DD` on disk)
    Date,
    /// Text restricted to a fixed set of variants
    Enum(&'static [&'static str]),
}

impl ColumnType {
    /// Human-readable type name, matching [`Value::type_name`]
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Text => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Enum(_) => "enum",
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name, as it appears in the container header
    pub name: &'static str,
    /// Semantic type
    pub ty: ColumnType,
    /// Whether `Null` is rejected
    pub required: bool,
}

impl Column {
    /// A column that must always hold a value
    pub const fn required(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            required: true,
        }
    }

    /// A column that may hold `Null`
    pub const fn optional(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            required: false,
        }
    }

    /// Check that a value is acceptable for this column
    ///
    /// Returns a description of the problem on failure.
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match (self.ty, value) {
            (_, Value::Null) if self.required => Err(format!("{} is required", self.name)),
            (_, Value::Null) => Ok(()),
            (ColumnType::Integer, Value::Int(_)) => Ok(()),
            (ColumnType::Boolean, Value::Bool(_)) => Ok(()),
            (ColumnType::Date, Value::Date(_)) => Ok(()),
            (ColumnType::Text, Value::Text(s)) => {
                if self.required && s.trim().is_empty() {
                    Err(format!("{} must not be empty", self.name))
                } else {
                    Ok(())
                }
            }
            (ColumnType::Enum(variants), Value::Text(s)) => {
                if variants.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(format!(
                        "{} must be one of {:?}, got {:?}",
                        self.name, variants, s
                    ))
                }
            }
            (ty, other) => Err(format!(
                "{} expects {}, got {}",
                self.name,
                ty.name(),
                other.type_name()
            )),
        }
    }
}

/// A foreign-key reference from `column` to the primary key of `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing column in this table
    pub column: &'static str,
    /// Referenced table
    pub target: TableId,
}

// ============================================================================
// Table schema
// ============================================================================

/// Static description of one table
#[derive(Debug)]
pub struct TableSchema {
    /// Which table this describes
    pub table: TableId,
    /// Columns in declared (header) order; column 0 is the primary key
    pub columns: &'static [Column],
    /// Uniqueness-constrained columns
    pub unique: &'static [&'static str],
    /// Foreign-key references
    pub foreign_keys: &'static [ForeignKey],
    /// Column filtered by date-range queries
    pub date_column: Option<&'static str>,
    /// Columns matched by free-text search
    pub search_columns: &'static [&'static str],
    /// Columns computed by the store at create time, immutable afterwards
    pub derived: &'static [&'static str],
}

impl TableSchema {
    /// Name of the primary-key column
    pub fn primary_key(&self) -> &'static str {
        PRIMARY_KEY
    }

    /// Position of a column in the header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column definition by name
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Header names in declared order
    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Foreign-key definition for a column, if it is one
    pub fn foreign_key(&self, column: &str) -> Option<&'static ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// Whether the column carries a uniqueness constraint
    pub fn is_unique(&self, column: &str) -> bool {
        self.unique.contains(&column)
    }

    /// Whether `update` must refuse to change this column
    ///
    /// The primary key, every foreign key and every derived column are
    /// fixed once the row exists.
    pub fn is_immutable(&self, column: &str) -> bool {
        column == PRIMARY_KEY
            || self.foreign_key(column).is_some()
            || self.derived.contains(&column)
    }
}

use ColumnType::{Boolean, Date, Integer, Text};

static USERS: TableSchema = TableSchema {
    table: TableId::Users,
    columns: &[
        Column::required("id", Integer),
        Column::required("username", Text),
        Column::required("password_hash", Text),
        Column::required("full_name", Text),
        Column::optional("email", Text),
        Column::required("role", ColumnType::Enum(USER_ROLES)),
        Column::required("is_active", Boolean),
        Column::required("must_change_password", Boolean),
    ],
    unique: &["username"],
    foreign_keys: &[],
    date_column: None,
    search_columns: &["username", "full_name"],
    derived: &[],
};

static CIE10_CODES: TableSchema = TableSchema {
    table: TableId::Cie10Codes,
    columns: &[
        Column::required("id", Integer),
        Column::required("code", Text),
        Column::required("description", Text),
        Column::optional("category", Text),
        Column::required("is_active", Boolean),
    ],
    unique: &["code"],
    foreign_keys: &[],
    date_column: None,
    search_columns: &["code", "description"],
    derived: &[],
};

static PATIENTS: TableSchema = TableSchema {
    table: TableId::Patients,
    columns: &[
        Column::required("id", Integer),
        Column::required("identification", Text),
        Column::required("full_name", Text),
        Column::optional("position", Text),
        Column::optional("work_area", Text),
        Column::optional("company", Text),
        Column::optional("birth_date", Date),
        Column::optional("phone", Text),
    ],
    unique: &["identification"],
    foreign_keys: &[],
    date_column: None,
    search_columns: &["identification", "full_name"],
    derived: &[],
};

static MEDICAL_RECORDS: TableSchema = TableSchema {
    table: TableId::MedicalRecords,
    columns: &[
        Column::required("id", Integer),
        Column::required("patient_id", Integer),
        Column::required("doctor_id", Integer),
        Column::required("date", Date),
        Column::required("time", Text),
        Column::required("consult_type", Text),
        Column::optional("cie10_code", Text),
        Column::required("diagnosis", Text),
        Column::optional("prescription", Text),
        Column::required("days_of_rest", Integer),
        Column::required("monthly_count", Integer),
        Column::required("annual_count", Integer),
        Column::required("certificate_generated", Boolean),
    ],
    unique: &[],
    foreign_keys: &[
        ForeignKey {
            column: "patient_id",
            target: TableId::Patients,
        },
        ForeignKey {
            column: "doctor_id",
            target: TableId::Users,
        },
    ],
    date_column: Some("date"),
    search_columns: &["cie10_code", "diagnosis"],
    derived: &["monthly_count", "annual_count"],
};

static INCIDENTS: TableSchema = TableSchema {
    table: TableId::Incidents,
    columns: &[
        Column::required("id", Integer),
        Column::required("patient_id", Integer),
        Column::required("doctor_id", Integer),
        Column::required("date", Date),
        Column::required("diagnosis", Text),
        Column::optional("cie10_code", Text),
        Column::optional("secondary_code", Text),
        Column::optional("description", Text),
        Column::required("pdf_generated", Boolean),
    ],
    unique: &[],
    foreign_keys: &[
        ForeignKey {
            column: "patient_id",
            target: TableId::Patients,
        },
        ForeignKey {
            column: "doctor_id",
            target: TableId::Users,
        },
    ],
    date_column: Some("date"),
    search_columns: &["cie10_code", "diagnosis"],
    derived: &[],
};

static ANTIDOPING_RECORDS: TableSchema = TableSchema {
    table: TableId::AntidopingRecords,
    columns: &[
        Column::required("id", Integer),
        Column::required("patient_id", Integer),
        Column::required("date", Date),
        Column::required("identification", Text),
        Column::required("verification", Text),
        Column::required("evaluation", Text),
    ],
    unique: &[],
    foreign_keys: &[ForeignKey {
        column: "patient_id",
        target: TableId::Patients,
    }],
    date_column: Some("date"),
    search_columns: &["identification"],
    derived: &[],
};

static CERTIFICATES: TableSchema = TableSchema {
    table: TableId::Certificates,
    columns: &[
        Column::required("id", Integer),
        Column::required("medical_record_id", Integer),
        Column::required("patient_id", Integer),
        Column::required("doctor_id", Integer),
        Column::required("start_date", Date),
        Column::required("end_date", Date),
        Column::required("valid_days", Integer),
        Column::required("pdf_generated", Boolean),
    ],
    unique: &[],
    foreign_keys: &[
        ForeignKey {
            column: "medical_record_id",
            target: TableId::MedicalRecords,
        },
        ForeignKey {
            column: "patient_id",
            target: TableId::Patients,
        },
        ForeignKey {
            column: "doctor_id",
            target: TableId::Users,
        },
    ],
    date_column: Some("start_date"),
    search_columns: &[],
    derived: &["valid_days"],
};

/// Look up the schema of a table
pub fn schema(table: TableId) -> &'static TableSchema {
    match table {
        TableId::Users => &USERS,
        TableId::Cie10Codes => &CIE10_CODES,
        TableId::Patients => &PATIENTS,
        TableId::MedicalRecords => &MEDICAL_RECORDS,
        TableId::Incidents => &INCIDENTS,
        TableId::AntidopingRecords => &ANTIDOPING_RECORDS,
        TableId::Certificates => &CERTIFICATES,
    }
}
