//! Law-style checks for the primary/inverse contract across the catalog.

use chrono::NaiveDate;
use proptest::prelude::*;
use screener_core::conditions::predicate::{Cmp, EvalContext};
use screener_core::conditions::{CATALOG, InversePolicy, Predicate};
use screener_core::series::{PriceSeries, Sample, localize_naive};
use screener_core::slicing::{day_bars, previous_day_bars};

const ALL_CMPS: [Cmp; 6] = [Cmp::Ge, Cmp::Gt, Cmp::Le, Cmp::Lt, Cmp::Eq, Cmp::Ne];

proptest! {
    /// Strict logical negation: `inverse(x, y) == !primary(x, y)` for every
    /// comparator on finite operands.
    #[test]
    fn logical_negation_law(a in -1e9f64..1e9, b in -1e9f64..1e9) {
        for cmp in ALL_CMPS {
            prop_assert_eq!(cmp.negated().apply(a, b), !cmp.apply(a, b));
        }
    }

    /// Symmetrical swap: on distinct operands exactly one side holds; on
    /// equal operands both directional framings accept.
    #[test]
    fn symmetrical_swap_law(a in -1e9f64..1e9, b in -1e9f64..1e9) {
        for cmp in [Cmp::Le, Cmp::Ge] {
            let primary = cmp.apply(a, b);
            let inverse = cmp.symmetrical().apply(a, b);
            if a != b {
                prop_assert_ne!(primary, inverse);
            } else {
                prop_assert!(primary && inverse);
            }
        }
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

/// A two-day series where every hour 4–19 today and 16–19 on the prior day
/// resolves, with strictly distinct field values everywhere.
fn fully_populated_series() -> PriceSeries {
    let mut samples = Vec::new();
    let prior = today() - chrono::Duration::days(1);
    for (date, hours) in [(prior, 16..20u32), (today(), 4..20u32)] {
        for hour in hours {
            let base = if date == today() {
                1000.0 + hour as f64 * 17.0
            } else {
                500.0 + hour as f64 * 13.0
            };
            samples.push(Sample {
                timestamp: localize_naive(date.and_hms_opt(hour, 0, 0).unwrap()).unwrap(),
                open: base + 0.1,
                high: base + 5.3,
                low: base - 4.7,
                close: base + 1.9,
                volume: Some(1000.0 + hour as f64),
            });
        }
    }
    PriceSeries::new("LAW", samples)
}

#[test]
fn every_condition_resolves_on_full_data() {
    let series = fully_populated_series();
    let ctx = EvalContext {
        today: day_bars(&series, today()),
        prior: previous_day_bars(&series, today(), 7),
        reference_open16: Some(100.0),
    };

    for (id, cond) in CATALOG.iter() {
        let out = cond.predicate.evaluate(&ctx);
        assert!(out.primary.is_some(), "condition {id} primary unresolved");
        assert!(out.inverse.is_some(), "condition {id} inverse unresolved");
    }
}

#[test]
fn catalog_outcomes_respect_their_inverse_policy() {
    // All field values in the series are strictly distinct, so even the
    // symmetrical families must disagree between primary and inverse.
    let series = fully_populated_series();
    let ctx = EvalContext {
        today: day_bars(&series, today()),
        prior: previous_day_bars(&series, today(), 7),
        reference_open16: Some(100.0),
    };

    for (id, cond) in CATALOG.iter() {
        let out = cond.predicate.evaluate(&ctx);
        let (primary, inverse) = (out.primary.unwrap(), out.inverse.unwrap());
        assert_ne!(primary, inverse, "condition {id} sides agree on distinct data");
    }
}

#[test]
fn progression_equality_accepts_both_framings_logical_does_not() {
    // Two identical consecutive bars: flat hour-over-hour lows/highs.
    let date = today();
    let mut samples = Vec::new();
    for hour in [4u32, 5] {
        samples.push(Sample {
            timestamp: localize_naive(date.and_hms_opt(hour, 0, 0).unwrap()).unwrap(),
            open: 10.0,
            high: 12.0,
            low: 9.0,
            close: 11.0,
            volume: None,
        });
    }
    let series = PriceSeries::new("FLAT", samples);
    let ctx = EvalContext {
        today: day_bars(&series, date),
        prior: None,
        reference_open16: None,
    };

    // Condition 20 (Low 5h ≤ Low 4h) is symmetrical: equality satisfies
    // both framings.
    let c20 = CATALOG.get(&20).unwrap().predicate.evaluate(&ctx);
    assert_eq!(c20.primary, Some(true));
    assert_eq!(c20.inverse, Some(true));

    // Condition 81 (Low 5h ≤ Low 4h, logical policy): equality belongs to
    // the primary side only.
    let c81 = CATALOG.get(&81).unwrap().predicate.evaluate(&ctx);
    assert_eq!(c81.primary, Some(true));
    assert_eq!(c81.inverse, Some(false));
}

#[test]
fn only_bar_pairs_carry_a_policy_tag() {
    // The explicit policy enum lives on the bar-vs-bar family; every other
    // family inverts logically by construction.
    let symmetrical: Vec<_> = CATALOG
        .iter()
        .filter(|(_, c)| {
            matches!(
                c.predicate,
                Predicate::BarPair {
                    inverse: InversePolicy::Symmetrical,
                    ..
                }
            )
        })
        .map(|(id, _)| *id)
        .collect();
    let expected: Vec<u16> = (19..=34).chain(51..=66).collect();
    assert_eq!(symmetrical, expected);
}
