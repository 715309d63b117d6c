//! Core types for ClinicDB
//!
//! This crate defines the foundational types used throughout the store:
//! - TableId / TableSchema: the static schema registry
//! - Value: cell values
//! - Row / Changes: untyped rows and partial updates
//! - Entity: typed per-table structs and creation payloads
//! - Error: error taxonomy shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entities;
pub mod error;
pub mod row;
pub mod schema;
pub mod value;

pub use entities::{
    AntidopingRecord, Certificate, Cie10Code, Entity, Incident, MedicalRecord, NewAntidopingRecord,
    NewCertificate, NewCie10Code, NewIncident, NewMedicalRecord, NewPatient, NewUser, Patient,
    Role, User,
};
pub use error::{Error, Result};
pub use row::{Changes, Row};
pub use schema::{schema, Column, ColumnType, ForeignKey, TableId, TableSchema, PRIMARY_KEY};
pub use value::Value;
