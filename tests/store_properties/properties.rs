//! Property tests: id monotonicity and pagination arithmetic.

use crate::common::*;
use clinicdb::Filter;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any mix of accepted and rejected creates yields strictly increasing,
    /// gap-free ids for the accepted ones.
    #[test]
    fn ids_strictly_increase(keys in prop::collection::vec(0u8..12, 1..30)) {
        let t = TestClinic::new();
        let mut accepted = Vec::new();
        for key in keys {
            if let Ok(p) = t.clinic.patients.create(patient(&format!("K{}", key))) {
                accepted.push(p.id);
            }
        }
        let expected: Vec<i64> = (1..=accepted.len() as i64).collect();
        prop_assert_eq!(accepted, expected);
    }

    /// Pages partition the table: every row appears on exactly one page,
    /// in insertion order.
    #[test]
    fn pages_partition_rows(rows in 0usize..40, limit in 1usize..12) {
        let t = TestClinic::new();
        for i in 0..rows {
            t.clinic.cie10_codes.create(cie10(&format!("Z{:03}", i), "code")).unwrap();
        }
        let first = t.clinic.cie10_codes.get_all(1, limit, &Filter::new()).unwrap();
        prop_assert_eq!(first.info.total, rows);
        prop_assert_eq!(first.info.total_pages, (rows + limit - 1) / limit);

        let mut seen = Vec::new();
        for page in 1..=first.info.total_pages + 1 {
            let p = t.clinic.cie10_codes.get_all(page, limit, &Filter::new()).unwrap();
            prop_assert!(p.items.len() <= limit);
            if page > first.info.total_pages {
                prop_assert!(p.items.is_empty());
            }
            seen.extend(p.items.into_iter().map(|c| c.id));
        }
        prop_assert_eq!(seen, (1..=rows as i64).collect::<Vec<_>>());
    }
}
