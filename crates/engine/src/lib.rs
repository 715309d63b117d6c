//! Store engine for ClinicDB
//!
//! This crate ties storage and concurrency together:
//! - Store: opens the data directory and runs every table operation
//! - Table<E>: typed, per-entity facade over the store
//! - Clinic: all seven tables plus the certificate workflow
//! - query: filters, pagination and search over published snapshots
//! - export: standalone containers of a date-range selection
//! - seed: idempotent bootstrap data
//!
//! # Example
//!
//! ```ignore
//! let clinic = Clinic::open("/var/lib/clinic")?;
//! let patient = clinic.patients.create(NewPatient { .. })?;
//! let page = clinic.medical_records.get_all(1, 20, &Filter::new().reference("patient_id", patient.id))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clinic;
pub mod export;
pub mod query;
pub mod seed;
pub mod store;
pub mod table;

pub use clinic::Clinic;
pub use export::ExportReport;
pub use query::{Filter, Page, PageInfo};
pub use seed::{load_cie10_file, seed_admin, seed_cie10, seed_users, SeedOutcome, SeedReport};
pub use store::{Store, StoreConfig, TableStatus, CONFIG_FILE_NAME, LOCK_FILE_NAME};
pub use table::Table;

pub use clinicdb_concurrency::SectionMetrics;
pub use clinicdb_core::{Changes, Error, Result, Row, TableId, Value};
