//! ClinicDB - file-backed table store for a clinical record-keeping service
//!
//! ClinicDB keeps seven related tables (users, CIE10 codes, patients,
//! consultations, incidents, antidoping tests, leave certificates), each in
//! one JSON Lines container inside a data directory.
//!
//! # Quick Start
//!
//! ```ignore
//! use clinicdb::{Clinic, Filter, NewPatient};
//!
//! let clinic = Clinic::open("/var/lib/clinic")?;
//! let patient = clinic.patients.create(NewPatient {
//!     identification: "0912345678".into(),
//!     full_name: "Ana Torres".into(),
//!     ..Default::default()
//! })?;
//! let page = clinic.medical_records.get_all(
//!     1,
//!     20,
//!     &Filter::new().reference("patient_id", patient.id),
//! )?;
//! ```
//!
//! # Architecture
//!
//! - `clinicdb-core`: schema registry, values, rows, typed entities, errors
//! - `clinicdb-storage`: containers, the codec and the snapshot cache
//! - `clinicdb-concurrency`: one exclusive section per table
//! - `clinicdb-engine`: the store, queries, export, seeding
//!
//! Only the engine API and the entity types are re-exported here.

pub use clinicdb_core::{
    AntidopingRecord, Certificate, Cie10Code, Entity, Incident, MedicalRecord,
    NewAntidopingRecord, NewCertificate, NewCie10Code, NewIncident, NewMedicalRecord, NewPatient,
    NewUser, Patient, Role, User,
};
pub use clinicdb_engine::*;
