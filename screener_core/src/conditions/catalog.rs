//! The published condition catalog: 142 price-relationship conditions over
//! today's and the prior day's hourly bars.
//!
//! Families are generated by loops over hour ranges rather than written out
//! one by one; ids and labels match the published condition table exactly.
//! Two cross-day conditions (19 and 51) and the two intraday progression
//! families (20–34 and 52–66) carry the symmetrical inverse policy; every
//! other comparator condition inverts by strict logical negation.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::bars::{Agg, Field};
use crate::conditions::predicate::{BarRef, Cmp, InversePolicy, Predicate, Source};

/// Catalog condition identifier, `1..=142`.
pub type ConditionId = u16;

/// An immutable condition definition.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Identifier as published, `1..=142`.
    pub id: ConditionId,
    /// Human-readable description, as shown to the user.
    pub label: String,
    /// The predicate evaluated for this condition.
    pub predicate: Predicate,
}

/// The full catalog, in id order.
pub static CATALOG: Lazy<IndexMap<ConditionId, Condition>> = Lazy::new(build_catalog);

/// Look up a condition by id.
pub fn condition(id: ConditionId) -> Option<&'static Condition> {
    CATALOG.get(&id)
}

fn build_catalog() -> IndexMap<ConditionId, Condition> {
    let mut catalog = IndexMap::with_capacity(142);
    let mut push = |id: ConditionId, label: String, predicate: Predicate| {
        let prev = catalog.insert(
            id,
            Condition {
                id,
                label,
                predicate,
            },
        );
        debug_assert!(prev.is_none(), "duplicate condition id {id}");
    };

    // 1–2: Close ≥ Open on DAY-1 at 18h and 19h.
    for (id, hour) in (1..).zip([18, 19]) {
        push(
            id,
            format!("Close {hour}h DAY-1 ≥ Open {hour}h DAY-1"),
            close_above_open(Source::Prior, hour),
        );
    }

    // 3–18: Close ≥ Open from 4h to 19h.
    for (id, hour) in (3..).zip(4..20) {
        push(
            id,
            format!("Close {hour}h ≥ Open {hour}h"),
            close_above_open(Source::Today, hour),
        );
    }

    // 19: Low 4h ≤ Low 19h DAY-1 (cross-day, symmetrical inverse).
    push(
        19,
        "Low 4h ≤ Low 19h DAY-1".to_string(),
        cross_day(4, 19, Field::Low, Cmp::Le, InversePolicy::Symmetrical),
    );

    // 20–34: Low progression, Low h ≤ Low h-1 (symmetrical inverse).
    for (id, hour) in (20..).zip(5..20) {
        push(
            id,
            format!("Low {hour}h ≤ Low {}h", hour - 1),
            progression(hour, Field::Low, Cmp::Le),
        );
    }

    // 35–46: High h ≥ max High [4;15].
    for (id, hour) in (35..).zip(4..16) {
        push(
            id,
            format!("High {hour}h ≥ High [4;15]"),
            against_range(hour, Field::High, 4..16, Agg::Max, Cmp::Ge),
        );
    }

    // 47–50: High h ≥ max High [4;19].
    for (id, hour) in (47..).zip(16..20) {
        push(
            id,
            format!("High {hour}h ≥ High [4;19]"),
            against_range(hour, Field::High, 4..20, Agg::Max, Cmp::Ge),
        );
    }

    // 51: High 4h ≥ High 19h DAY-1 (cross-day, symmetrical inverse).
    push(
        51,
        "High 4h ≥ High 19h DAY-1".to_string(),
        cross_day(4, 19, Field::High, Cmp::Ge, InversePolicy::Symmetrical),
    );

    // 52–66: High progression, High h ≥ High h-1 (symmetrical inverse).
    for (id, hour) in (52..).zip(5..20) {
        push(
            id,
            format!("High {hour}h ≥ High {}h", hour - 1),
            progression(hour, Field::High, Cmp::Ge),
        );
    }

    // 67–68: hour 10 breaks the morning range.
    push(
        67,
        "High 10h > High [4;9]".to_string(),
        against_range(10, Field::High, 4..10, Agg::Max, Cmp::Gt),
    );
    push(
        68,
        "Low 10h < Low [4;9]".to_string(),
        against_range(10, Field::Low, 4..10, Agg::Min, Cmp::Lt),
    );

    // 69–76: Open/Close distinct from Low/High for 4h and 5h.
    for (id, hour) in (69..).zip([4, 4, 4, 4, 5, 5, 5, 5]) {
        let (lhs, rhs) = match (id - 69) % 4 {
            0 => (Field::Open, Field::Low),
            1 => (Field::Open, Field::High),
            2 => (Field::Close, Field::Low),
            _ => (Field::Close, Field::High),
        };
        push(
            id,
            format!("{} {hour}h ≠ {} {hour}h", lhs.label(), rhs.label()),
            Predicate::FieldPair {
                source: Source::Today,
                hour,
                lhs,
                rhs,
                cmp: Cmp::Ne,
            },
        );
    }

    // 77–79: the first three bars of the day close at or above their open.
    for (index, ordinal) in ["First", "Second", "Third"].iter().enumerate() {
        push(
            77 + index as ConditionId,
            format!("{ordinal} bar : Close ≥ Open"),
            Predicate::NthBarCloseAboveOpen { index },
        );
    }

    // 80–81: early-session low comparisons (logical inverse).
    push(
        80,
        "Low First bar ≤ Low 19h DAY-1".to_string(),
        cross_day(4, 19, Field::Low, Cmp::Le, InversePolicy::Logical),
    );
    push(
        81,
        "Low Second bar ≤ Low First bar".to_string(),
        Predicate::BarPair {
            lhs: BarRef {
                source: Source::Today,
                hour: 5,
            },
            rhs: BarRef {
                source: Source::Today,
                hour: 4,
            },
            field: Field::Low,
            cmp: Cmp::Le,
            inverse: InversePolicy::Logical,
        },
    );

    // 82–83: opening hour against its neighbourhood.
    push(
        82,
        "High 4h ≥ High [5;8]".to_string(),
        against_range(4, Field::High, 5..9, Agg::Max, Cmp::Ge),
    );
    push(
        83,
        "High 8h ≥ High [4;7]".to_string(),
        against_range(8, Field::High, 4..8, Agg::Max, Cmp::Ge),
    );

    // 84–85: High ≠ Low on DAY-1 at 18h and 19h.
    for (id, hour) in (84..).zip([18, 19]) {
        push(
            id,
            format!("High {hour}h DAY-1 ≠ Low {hour}h DAY-1"),
            Predicate::FieldPair {
                source: Source::Prior,
                hour,
                lhs: Field::High,
                rhs: Field::Low,
                cmp: Cmp::Ne,
            },
        );
    }

    // 86–101: High ≠ Low from 4h to 19h.
    for (id, hour) in (86..).zip(4..20) {
        push(
            id,
            format!("High {hour}h ≠ Low {hour}h"),
            Predicate::FieldPair {
                source: Source::Today,
                hour,
                lhs: Field::High,
                rhs: Field::Low,
                cmp: Cmp::Ne,
            },
        );
    }

    // 102–107: the day's first bar falls on hour h.
    for (id, hour) in (102..).zip(4..10) {
        push(
            id,
            format!("First bar = {hour}h"),
            Predicate::FirstBarAtHour { hour },
        );
    }

    // 108–123: Open/Close pinned to Low/High in the 16h–19h hours.
    for (base, lhs, rhs) in [
        (108, Field::Open, Field::Low),
        (112, Field::Open, Field::High),
        (116, Field::Close, Field::Low),
        (120, Field::Close, Field::High),
    ] {
        for (id, hour) in (base..).zip(16..20) {
            push(
                id,
                format!("{} {hour}h = {} {hour}h", lhs.label(), rhs.label()),
                Predicate::FieldPair {
                    source: Source::Today,
                    hour,
                    lhs,
                    rhs,
                    cmp: Cmp::Eq,
                },
            );
        }
    }

    // 124–125: composite-window high against the carried 16h open.
    for (id, factor) in [(124, 1.5), (125, 1.7)] {
        push(
            id,
            format!("High [16h DAY-1 ; 19h DAY] > {factor} * Open 16h DAY-1"),
            Predicate::RangeHighAboveReference { factor },
        );
    }

    // 126: today's high against twice the prior 19h close.
    push(
        126,
        "High [4h DAY ; 19h DAY] > 2 * Close 19h DAY-1".to_string(),
        Predicate::RangeHighAbovePriorClose {
            prior_hour: 19,
            multiplier: 2.0,
        },
    );

    // 127–138: Low h ≤ min Low [4;15].
    for (id, hour) in (127..).zip(4..16) {
        push(
            id,
            format!("Low {hour}h ≤ Low [4;15]"),
            against_range(hour, Field::Low, 4..16, Agg::Min, Cmp::Le),
        );
    }

    // 139–142: Low h ≤ min Low [4;19].
    for (id, hour) in (139..).zip(16..20) {
        push(
            id,
            format!("Low {hour}h ≤ Low [4;19]"),
            against_range(hour, Field::Low, 4..20, Agg::Min, Cmp::Le),
        );
    }

    catalog
}

fn close_above_open(source: Source, hour: u32) -> Predicate {
    Predicate::FieldPair {
        source,
        hour,
        lhs: Field::Close,
        rhs: Field::Open,
        cmp: Cmp::Ge,
    }
}

/// Today's `hour` against the prior day's `prior_hour`.
fn cross_day(
    hour: u32,
    prior_hour: u32,
    field: Field,
    cmp: Cmp,
    inverse: InversePolicy,
) -> Predicate {
    Predicate::BarPair {
        lhs: BarRef {
            source: Source::Today,
            hour,
        },
        rhs: BarRef {
            source: Source::Prior,
            hour: prior_hour,
        },
        field,
        cmp,
        inverse,
    }
}

/// Hour-over-hour progression within today (symmetrical inverse family).
fn progression(hour: u32, field: Field, cmp: Cmp) -> Predicate {
    Predicate::BarPair {
        lhs: BarRef {
            source: Source::Today,
            hour,
        },
        rhs: BarRef {
            source: Source::Today,
            hour: hour - 1,
        },
        field,
        cmp,
        inverse: InversePolicy::Symmetrical,
    }
}

fn against_range(
    hour: u32,
    field: Field,
    hours: std::ops::Range<u32>,
    agg: Agg,
    cmp: Cmp,
) -> Predicate {
    Predicate::BarVsRange {
        hour,
        field,
        hours,
        agg,
        cmp,
    }
}
