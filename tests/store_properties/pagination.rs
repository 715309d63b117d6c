//! get_all pagination and filtering.

use crate::common::*;
use clinicdb::{Error, Filter};

fn with_25_codes() -> TestClinic {
    let t = TestClinic::new();
    for i in 1..=25 {
        t.clinic
            .cie10_codes
            .create(cie10(&format!("K{:02}", i), "Digestive"))
            .unwrap();
    }
    t
}

#[test]
fn page_two_of_three() {
    let t = with_25_codes();
    let page = t.clinic.cie10_codes.get_all(2, 10, &Filter::new()).unwrap();
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.items[0].id, 11);
    assert_eq!(page.info.total, 25);
    assert_eq!(page.info.page, 2);
    assert_eq!(page.info.limit, 10);
    assert_eq!(page.info.total_pages, 3);
}

#[test]
fn last_and_past_last_page() {
    let t = with_25_codes();
    let page = t.clinic.cie10_codes.get_all(3, 10, &Filter::new()).unwrap();
    assert_eq!(page.items.len(), 5);

    let page = t.clinic.cie10_codes.get_all(4, 10, &Filter::new()).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.info.total, 25);
}

#[test]
fn unbounded_limit_returns_everything() {
    let t = with_25_codes();
    let page = t.clinic.cie10_codes.get_all(1, usize::MAX, &Filter::new()).unwrap();
    assert_eq!(page.items.len(), 25);
    assert_eq!(page.info.total_pages, 1);
}

#[test]
fn zero_page_or_limit_rejected() {
    let t = with_25_codes();
    assert!(matches!(
        t.clinic.cie10_codes.get_all(0, 10, &Filter::new()),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        t.clinic.cie10_codes.get_all(1, 0, &Filter::new()),
        Err(Error::Validation(_))
    ));
}

#[test]
fn filter_by_patient_and_dates() {
    let t = TestClinic::new();
    let (doctor_id, first) = t.doctor_and_patient();
    let second = t.clinic.patients.create(patient("0900000002")).unwrap().id;
    for (patient_id, day) in [
        (first, date(2024, 3, 1)),
        (second, date(2024, 3, 2)),
        (first, date(2024, 3, 15)),
        (first, date(2024, 4, 1)),
    ] {
        t.clinic
            .medical_records
            .create(consultation(patient_id, doctor_id, day))
            .unwrap();
    }

    let filter = Filter::new()
        .reference("patient_id", first)
        .between(date(2024, 3, 1), date(2024, 3, 31));
    let page = t.clinic.medical_records.get_all(1, 10, &filter).unwrap();
    assert_eq!(page.info.total, 2);
    assert!(page.items.iter().all(|r| r.patient_id == first));
    assert_eq!(page.items[1].date, date(2024, 3, 15));
}

#[test]
fn invalid_filters_rejected() {
    let t = TestClinic::new();
    let err = t
        .clinic
        .patients
        .get_all(1, 10, &Filter::new().since(date(2024, 1, 1)))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = t
        .clinic
        .medical_records
        .get_all(1, 10, &Filter::new().reference("diagnosis", 1))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
