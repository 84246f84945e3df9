//! Property-based tests for the filtering and aggregation engine.
//!
//! Datasets are generated with nullable fields so every property is also
//! checked against missing values.

use churn_lens::{
    aggregate, aggregate_binned, apply, bin, summarize, BinSpec, CustomerRecord, Dataset,
    FilterSpec,
};
use proptest::prelude::*;

const GEOGRAPHIES: [&str; 3] = ["France", "Germany", "Spain"];

fn record_strategy() -> impl Strategy<Value = CustomerRecord> {
    (
        proptest::option::weighted(0.9, 300i64..=900),
        proptest::option::weighted(0.9, 18i64..=95),
        proptest::option::weighted(0.9, 0.0f64..250_000.0),
        proptest::option::weighted(0.9, 0usize..GEOGRAPHIES.len()),
        proptest::option::weighted(0.9, 0i64..=1),
    )
        .prop_map(|(credit_score, age, balance, geo, exited)| CustomerRecord {
            credit_score,
            age,
            balance,
            geography: geo.map(|i| GEOGRAPHIES[i].to_string()),
            exited,
            ..Default::default()
        })
}

fn dataset_strategy() -> impl Strategy<Value = Dataset> {
    proptest::collection::vec(record_strategy(), 0..60).prop_map(Dataset::new)
}

fn range_spec_strategy() -> impl Strategy<Value = FilterSpec> {
    (300.0f64..900.0, 0.0f64..300.0, 18.0f64..95.0, 0.0f64..40.0).prop_map(
        |(score_lo, score_span, age_lo, age_span)| {
            FilterSpec::new()
                .range("CreditScore", score_lo, score_lo + score_span)
                .and_then(|s| s.range("Age", age_lo, age_lo + age_span))
                .expect("generated ranges are well formed")
        },
    )
}

fn geography_spec_strategy() -> impl Strategy<Value = FilterSpec> {
    proptest::sample::subsequence(GEOGRAPHIES.to_vec(), 0..=GEOGRAPHIES.len())
        .prop_map(|geos| FilterSpec::new().one_of("Geography", geos))
}

proptest! {
    #[test]
    fn filtering_is_idempotent(ds in dataset_strategy(), spec in range_spec_strategy()) {
        let once = apply(&ds, &spec).unwrap();
        let twice = apply(&once, &spec).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filter_order_does_not_matter(
        ds in dataset_strategy(),
        ranges in range_spec_strategy(),
        geos in geography_spec_strategy(),
    ) {
        let a = apply(&apply(&ds, &ranges).unwrap(), &geos).unwrap();
        let b = apply(&apply(&ds, &geos).unwrap(), &ranges).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn filtering_never_grows(ds in dataset_strategy(), spec in range_spec_strategy()) {
        let out = apply(&ds, &spec).unwrap();
        prop_assert!(out.len() <= ds.len());
        for record in out.records() {
            let score = record.credit_score.unwrap() as f64;
            let (lo, hi) = match spec.get("CreditScore") {
                Some(churn_lens::Constraint::Range { lo, hi }) => (*lo, *hi),
                _ => unreachable!(),
            };
            prop_assert!(lo <= score && score <= hi);
        }
    }

    #[test]
    fn aggregation_conserves_counts(ds in dataset_strategy()) {
        let rows = aggregate(&ds, "Geography", "Exited").unwrap();
        let total: usize = rows.iter().map(|r| r.count).sum();
        let complete = ds
            .records()
            .iter()
            .filter(|r| r.geography.is_some() && r.exited.is_some())
            .count();
        prop_assert!(total <= ds.len());
        prop_assert_eq!(total, complete);
    }

    #[test]
    fn rates_stay_in_bounds(ds in dataset_strategy(), bins in 1usize..8) {
        let binned = bin(&ds, "Balance", &BinSpec::equal_width(bins).unwrap()).unwrap();
        let rows = aggregate_binned(&binned, "Exited").unwrap();
        for row in &rows {
            prop_assert!(row.count > 0);
            prop_assert!((0.0..=1.0).contains(&row.mean));
            prop_assert!((0.0..=100.0).contains(&row.churn_rate));
        }
        let report = summarize(&ds);
        prop_assert!((0.0..=100.0).contains(&report.churn_rate));
    }

    #[test]
    fn equal_width_bins_cover_every_value(ds in dataset_strategy(), bins in 1usize..8) {
        let binned = bin(&ds, "Balance", &BinSpec::equal_width(bins).unwrap()).unwrap();
        let with_balance = ds.records().iter().filter(|r| r.balance.is_some()).count();
        prop_assert_eq!(binned.len(), with_balance);
        prop_assert_eq!(binned.len() + binned.dropped(), ds.len());
    }
}
