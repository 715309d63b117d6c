//! Uniqueness, foreign keys and validation leave the table untouched on rejection.

use crate::common::*;
use clinicdb::{Changes, Error, NewCertificate, NewIncident, TableId};

#[test]
fn duplicate_username_rejected() {
    let t = TestClinic::new();
    t.clinic.users.create(doctor("jdoe")).unwrap();
    let before = std::fs::read(t.store().table_path(TableId::Users)).unwrap();

    let err = t.clinic.users.create(doctor("jdoe")).unwrap_err();
    match err {
        Error::DuplicateKey {
            table,
            column,
            value,
        } => {
            assert_eq!(table, TableId::Users);
            assert_eq!(column, "username");
            assert_eq!(value, "jdoe");
        }
        other => panic!("expected DuplicateKey, got {:?}", other),
    }
    assert_eq!(t.clinic.users.count(), 1);
    assert_eq!(std::fs::read(t.store().table_path(TableId::Users)).unwrap(), before);
}

#[test]
fn unique_comparison_is_exact() {
    let t = TestClinic::new();
    t.clinic.cie10_codes.create(cie10("J00", "a")).unwrap();
    t.clinic.cie10_codes.create(cie10("j00", "b")).unwrap();
    assert_eq!(t.clinic.cie10_codes.count(), 2);
}

#[test]
fn dangling_patient_rejected() {
    let t = TestClinic::new();
    let doctor_id = t.clinic.users.create(doctor("d")).unwrap().id;
    let err = t
        .clinic
        .medical_records
        .create(consultation(42, doctor_id, date(2024, 1, 1)))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ReferentialIntegrity {
            table: TableId::MedicalRecords,
            column: "patient_id",
            target: TableId::Patients,
            id: 42,
        }
    ));
    assert_eq!(t.clinic.medical_records.count(), 0);
}

#[test]
fn every_foreign_key_is_checked() {
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();

    let err = t
        .clinic
        .incidents
        .create(NewIncident {
            patient_id,
            doctor_id: doctor_id + 10,
            date: date(2024, 1, 1),
            diagnosis: "Burn".into(),
            cie10_code: None,
            secondary_code: None,
            description: None,
        })
        .unwrap_err();
    assert!(matches!(err, Error::ReferentialIntegrity { column: "doctor_id", .. }));

    let err = t
        .clinic
        .certificates
        .create(NewCertificate {
            medical_record_id: 1,
            patient_id,
            doctor_id,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 2),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ReferentialIntegrity {
            column: "medical_record_id",
            ..
        }
    ));
}

#[test]
fn blank_required_text_rejected() {
    let t = TestClinic::new();
    let mut new = patient("X1");
    new.full_name = "   ".into();
    let err = t.clinic.patients.create(new).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(t.clinic.patients.count(), 0);
}

#[test]
fn update_cannot_move_a_record_to_another_patient() {
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    t.clinic.patients.create(patient("second")).unwrap();
    let record = t
        .clinic
        .medical_records
        .create(consultation(patient_id, doctor_id, date(2024, 2, 2)))
        .unwrap();

    let err = t
        .clinic
        .medical_records
        .update(record.id, &Changes::new().set("patient_id", 2i64))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(t.clinic.medical_records.get_by_id(record.id).unwrap(), record);
}

#[test]
fn update_rejects_wrong_type() {
    let t = TestClinic::new();
    let (doctor_id, _) = t.doctor_and_patient();
    let err = t
        .clinic
        .users
        .update(doctor_id, &Changes::new().set("is_active", "yes"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = t
        .clinic
        .users
        .update(doctor_id, &Changes::new().set("role", "superuser"))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
