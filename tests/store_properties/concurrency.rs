//! Concurrent creates through the typed API.

use crate::common::*;
use clinicdb::Error;
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn distinct_usernames_all_succeed_with_sequential_ids() {
    const THREADS: usize = 12;
    let t = TestClinic::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let users = t.clinic.users.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                users.create(doctor(&format!("doctor{}", i))).unwrap().id
            })
        })
        .collect();

    let ids: BTreeSet<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), THREADS);
    assert_eq!(ids, (1..=THREADS as i64).collect::<BTreeSet<_>>());
}

#[test]
fn same_username_exactly_one_succeeds() {
    const THREADS: usize = 12;
    let t = TestClinic::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let users = t.clinic.users.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                users.create(doctor("shared"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, Error::DuplicateKey { .. })));
    assert_eq!(t.clinic.users.count(), 1);
}

#[test]
fn concurrent_consultations_count_correctly() {
    const THREADS: usize = 8;
    let t = TestClinic::new();
    let (doctor_id, patient_id) = t.doctor_and_patient();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let records = t.clinic.medical_records.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                records
                    .create(consultation(patient_id, doctor_id, date(2024, 9, 9)))
                    .unwrap()
                    .monthly_count
            })
        })
        .collect();

    let counts: BTreeSet<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    // Serialized creates see each other: counts are 1..=N, each exactly once.
    assert_eq!(counts, (1..=THREADS as i64).collect::<BTreeSet<_>>());
}
