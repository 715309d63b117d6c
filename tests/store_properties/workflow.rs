//! Cross-table workflows run as independent critical sections.

use crate::common::*;
use clinicdb::{Changes, Error, NewCertificate};

#[test]
fn certificate_issue_flags_record() {
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    let record = t
        .clinic
        .medical_records
        .create(consultation(patient_id, doctor_id, date(2024, 10, 1)))
        .unwrap();
    assert!(!record.certificate_generated);

    let (cert, flagged) = t
        .clinic
        .issue_certificate(record.id, doctor_id, date(2024, 10, 1), date(2024, 10, 7))
        .unwrap();
    assert_eq!(cert.valid_days, 7);
    assert!(flagged.certificate_generated);

    let t = t.reopen();
    assert!(t.clinic.medical_records.get_by_id(record.id).unwrap().certificate_generated);
    assert_eq!(t.clinic.certificates.get_by_id(cert.id).unwrap(), cert);
}

#[test]
fn partial_workflow_leaves_each_table_consistent() {
    // A certificate created directly (the first step only) leaves the
    // consultation unflagged and nothing orphaned.
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    let record = t
        .clinic
        .medical_records
        .create(consultation(patient_id, doctor_id, date(2024, 10, 1)))
        .unwrap();
    let cert = t
        .clinic
        .certificates
        .create(NewCertificate {
            medical_record_id: record.id,
            patient_id,
            doctor_id,
            start_date: date(2024, 10, 1),
            end_date: date(2024, 10, 1),
        })
        .unwrap();

    let t = t.reopen();
    assert!(!t.clinic.medical_records.get_by_id(record.id).unwrap().certificate_generated);
    assert_eq!(t.clinic.certificates.get_by_id(cert.id).unwrap().medical_record_id, record.id);

    // Completing the second step later is an ordinary update.
    let flagged = t
        .clinic
        .medical_records
        .update(record.id, &Changes::new().set("certificate_generated", true))
        .unwrap();
    assert!(flagged.certificate_generated);
}

#[test]
fn derived_columns_are_fixed_after_create() {
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    let record = t
        .clinic
        .medical_records
        .create(consultation(patient_id, doctor_id, date(2024, 10, 1)))
        .unwrap();
    assert_eq!((record.monthly_count, record.annual_count), (1, 1));

    // Re-supplying the same value is accepted.
    t.clinic
        .medical_records
        .update(record.id, &Changes::new().set("annual_count", 1i64))
        .unwrap();
    let err = t
        .clinic
        .medical_records
        .update(record.id, &Changes::new().set("annual_count", 5i64))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
