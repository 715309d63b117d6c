//! Persist then reload yields identical rows in identical order.

use crate::common::*;
use clinicdb::{Changes, Entity, Filter, Patient, Store, StoreConfig, TableId};

#[test]
fn reload_preserves_rows_and_order() {
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    for day in [5, 1, 3] {
        t.clinic
            .medical_records
            .create(consultation(patient_id, doctor_id, date(2024, 5, day)))
            .unwrap();
    }
    t.clinic
        .medical_records
        .update(2, &Changes::new().set("prescription", "Paracetamol 500mg"))
        .unwrap();
    let before = t
        .clinic
        .medical_records
        .get_all(1, 100, &Filter::new())
        .unwrap()
        .items;

    let t = t.reopen();
    let after = t
        .clinic
        .medical_records
        .get_all(1, 100, &Filter::new())
        .unwrap()
        .items;
    assert_eq!(before, after);
    // Insertion order, not date order.
    assert_eq!(
        after.iter().map(|r| r.date).collect::<Vec<_>>(),
        vec![date(2024, 5, 5), date(2024, 5, 1), date(2024, 5, 3)]
    );
    assert_eq!(after[1].prescription.as_deref(), Some("Paracetamol 500mg"));
}

#[test]
fn optional_values_survive_reload() {
    let t = TestClinic::new();
    let mut new = patient("0911");
    new.birth_date = Some(date(1985, 12, 31));
    new.phone = None;
    new.position = Some("Operario \"A\", turno\tnoche".into());
    let created = t.clinic.patients.create(new).unwrap();

    let t = t.reopen();
    assert_eq!(t.clinic.patients.get_by_id(created.id).unwrap(), created);
}

#[test]
fn container_is_header_plus_one_line_per_row() {
    let t = TestClinic::new();
    t.clinic.cie10_codes.create(cie10("A00", "Colera")).unwrap();
    t.clinic.cie10_codes.create(cie10("A01", "Fiebre tifoidea")).unwrap();

    let content = std::fs::read_to_string(t.store().table_path(TableId::Cie10Codes)).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        r#"["id","code","description","category","is_active"]"#
    );
    assert_eq!(lines[1], r#"[1,"A00","Colera",null,true]"#);
}

#[test]
fn no_temporary_files_remain_after_writes() {
    let t = TestClinic::new();
    for i in 0..5 {
        t.clinic.patients.create(patient(&format!("T{}", i))).unwrap();
    }
    let leftovers: Vec<_> = std::fs::read_dir(t.dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "{:?}", leftovers);
}

#[test]
fn unsynced_store_still_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        sync_writes: false,
        ..Default::default()
    };
    {
        let store = Store::open_with_config(dir.path(), config).unwrap();
        store
            .create(Patient::new_row(patient("U1")))
            .unwrap();
    }
    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.count(TableId::Patients), 1);
    assert!(!store.config().sync_writes);
}
