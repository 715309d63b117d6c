//! export_selection returns exactly the inclusive range and leaves the source alone.

use crate::common::*;
use clinicdb::{Entity, Filter, Store, TableId};

#[test]
fn selection_is_inclusive_range() {
    let t = TestClinic::new();
    let (_, patient_id) = t.doctor_and_patient();
    for day in [1, 9, 10, 15, 20, 21, 28] {
        t.clinic
            .antidoping_records
            .create(antidoping(patient_id, date(2024, 2, day)))
            .unwrap();
    }

    let selected = t
        .clinic
        .antidoping_records
        .export_selection(date(2024, 2, 10), date(2024, 2, 20))
        .unwrap();
    let days: Vec<_> = selected.iter().map(|r| r.date).collect();
    assert_eq!(days, vec![date(2024, 2, 10), date(2024, 2, 15), date(2024, 2, 20)]);
    assert_eq!(t.clinic.antidoping_records.count(), 7);
}

#[test]
fn export_file_is_a_standalone_container() {
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    for day in 1..=4 {
        t.clinic
            .medical_records
            .create(consultation(patient_id, doctor_id, date(2024, 8, day)))
            .unwrap();
    }
    let source = t.store().table_path(TableId::MedicalRecords).to_path_buf();
    let before = std::fs::read(&source).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("medical_records.jsonl");
    let report = t
        .clinic
        .medical_records
        .export_to(date(2024, 8, 2), date(2024, 8, 3), &out)
        .unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(std::fs::read(&source).unwrap(), before);

    // The export opens as a data directory of its own.
    let exported = Store::open(out_dir.path()).unwrap();
    let rows = exported
        .export_selection(TableId::MedicalRecords, &Filter::new())
        .unwrap();
    let records: Vec<_> = rows
        .iter()
        .map(|r| clinicdb::MedicalRecord::from_row(r).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], t.clinic.medical_records.get_by_id(2).unwrap());
}

#[test]
fn inverted_range_rejected() {
    let t = TestClinic::new();
    let err = t
        .clinic
        .incidents
        .export_selection(date(2024, 3, 2), date(2024, 3, 1))
        .unwrap_err();
    assert!(matches!(err, clinicdb::Error::Validation(_)));
}
