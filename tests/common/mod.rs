//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use clinicdb::{
    Clinic, NewAntidopingRecord, NewCie10Code, NewMedicalRecord, NewPatient, NewUser, Role, Store,
};
use tempfile::TempDir;

// ============================================================================
// TestClinic - store in a temporary directory
// ============================================================================

/// Clinic over a fresh temporary data directory.
pub struct TestClinic {
    pub clinic: Clinic,
    pub dir: TempDir,
}

impl TestClinic {
    /// Open a clinic in a new temporary directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let clinic = Clinic::open(dir.path()).expect("Failed to open store");
        TestClinic { clinic, dir }
    }

    /// Shared store.
    pub fn store(&self) -> &Arc<Store> {
        self.clinic.store()
    }

    /// Drop the open store and open the same directory again.
    pub fn reopen(self) -> Self {
        let TestClinic { clinic, dir } = self;
        drop(clinic);
        let clinic = Clinic::open(dir.path()).expect("Failed to reopen store");
        TestClinic { clinic, dir }
    }

    /// Create a doctor and a patient, returning `(doctor_id, patient_id)`.
    pub fn doctor_and_patient(&self) -> (i64, i64) {
        let doctor = self.clinic.users.create(doctor("drsmith")).unwrap();
        let patient = self.clinic.patients.create(patient("0900000001")).unwrap();
        (doctor.id, patient.id)
    }
}

impl Default for TestClinic {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn doctor(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password_hash: "$argon2id$test".to_string(),
        full_name: format!("Dr. {}", username),
        email: None,
        role: Role::Doctor,
        is_active: true,
        must_change_password: false,
    }
}

pub fn patient(identification: &str) -> NewPatient {
    NewPatient {
        identification: identification.to_string(),
        full_name: format!("Patient {}", identification),
        ..Default::default()
    }
}

pub fn cie10(code: &str, description: &str) -> NewCie10Code {
    NewCie10Code {
        code: code.to_string(),
        description: description.to_string(),
        category: None,
    }
}

pub fn consultation(patient_id: i64, doctor_id: i64, day: NaiveDate) -> NewMedicalRecord {
    NewMedicalRecord {
        patient_id,
        doctor_id,
        date: day,
        time: "08:30".to_string(),
        consult_type: "general".to_string(),
        cie10_code: None,
        diagnosis: "Routine check".to_string(),
        prescription: None,
        days_of_rest: 0,
    }
}

pub fn antidoping(patient_id: i64, day: NaiveDate) -> NewAntidopingRecord {
    NewAntidopingRecord {
        patient_id,
        date: day,
        identification: "0900000001".to_string(),
        verification: "verified".to_string(),
        evaluation: "negative".to_string(),
    }
}
