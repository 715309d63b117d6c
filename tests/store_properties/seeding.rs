//! Seeding is idempotent: an existing key is skipped, never an error.

use crate::common::*;
use clinicdb::{load_cie10_file, seed_admin, seed_cie10, SeedReport};

#[test]
fn same_code_twice_created_then_skipped() {
    let t = TestClinic::new();
    let report = seed_cie10(
        &t.clinic.cie10_codes,
        vec![cie10("E11", "Diabetes tipo 2"), cie10("E11", "Duplicate in batch")],
    )
    .unwrap();
    assert_eq!(
        report,
        SeedReport {
            created: 1,
            skipped: 1
        }
    );
    assert_eq!(
        t.clinic
            .cie10_codes
            .find_unique("code", "E11")
            .unwrap()
            .unwrap()
            .description,
        "Diabetes tipo 2"
    );
}

#[test]
fn reseeding_after_restart_changes_nothing() {
    let t = TestClinic::new();
    let path = t.dir.path().join("seed.json");
    std::fs::write(
        &path,
        r#"[
            {"code": "I10", "description": "Hipertension esencial", "category": "I"},
            {"code": "E66", "description": "Obesidad"}
        ]"#,
    )
    .unwrap();

    let first = seed_cie10(&t.clinic.cie10_codes, load_cie10_file(&path).unwrap()).unwrap();
    assert_eq!(first.created, 2);
    seed_admin(&t.clinic.users, "admin", "hash", "Administrador", Some("admin@clinic.test"))
        .unwrap();

    let t = t.reopen();
    let second = seed_cie10(&t.clinic.cie10_codes, load_cie10_file(&path).unwrap()).unwrap();
    assert_eq!(second, SeedReport { created: 0, skipped: 2 });
    let again = seed_admin(&t.clinic.users, "admin", "other", "Other", None).unwrap();
    assert!(!again.is_created());
    assert_eq!(t.clinic.users.count(), 1);
    assert_eq!(t.clinic.cie10_codes.count(), 2);
}
