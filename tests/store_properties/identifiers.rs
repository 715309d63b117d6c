//! Id assignment: strictly increasing, never reused, restart after reset.

use crate::common::*;
use clinicdb::{Error, TableId};

#[test]
fn ids_start_at_one_and_increase() {
    let t = TestClinic::new();
    let ids: Vec<i64> = (0..5)
        .map(|i| {
            t.clinic
                .patients
                .create(patient(&format!("P{}", i)))
                .unwrap()
                .id
        })
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn failed_create_does_not_consume_an_id() {
    let t = TestClinic::new();
    t.clinic.patients.create(patient("A")).unwrap();
    let err = t.clinic.patients.create(patient("A")).unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));
    assert_eq!(t.clinic.patients.create(patient("B")).unwrap().id, 2);
}

#[test]
fn ids_are_per_table() {
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    assert_eq!((doctor_id, patient_id), (1, 1));
    let code = t.clinic.cie10_codes.create(cie10("A00", "Colera")).unwrap();
    assert_eq!(code.id, 1);
}

#[test]
fn reset_restarts_ids_at_one() {
    let t = TestClinic::new();
    for i in 0..3 {
        t.clinic.cie10_codes.create(cie10(&format!("C{}", i), "x")).unwrap();
    }
    t.clinic.cie10_codes.reset().unwrap();
    assert_eq!(t.store().count(TableId::Cie10Codes), 0);
    assert_eq!(t.clinic.cie10_codes.create(cie10("C9", "y")).unwrap().id, 1);

    // And the reset survives a restart.
    let t = t.reopen();
    assert_eq!(t.clinic.cie10_codes.count(), 1);
}

#[test]
fn get_by_id_miss_is_not_found() {
    let t = TestClinic::new();
    let err = t.clinic.users.get_by_id(3).unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            table: TableId::Users,
            id: 3
        }
    ));
}
