//! Typed predicate descriptors.
//!
//! Each catalog condition is a small declarative descriptor — which bars to
//! read, which comparator to apply, and which inverse policy governs the
//! "inverse" toggle — instead of a hand-written closure per condition.
//! Evaluation yields a `(primary, inverse)` pair of optional booleans:
//! `(None, None)` whenever any operand bar or reference price is
//! unresolved, so "condition is false" stays distinguishable from
//! "condition could not be computed".

use std::ops::Range;

use crate::bars::{Agg, Field, HourlyBar, bar_at_hour, first_bars, range_stat};
use crate::slicing::DayBars;

/// Binary comparator between two prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    /// `≥`
    Ge,
    /// `>`
    Gt,
    /// `≤`
    Le,
    /// `<`
    Lt,
    /// `=`
    Eq,
    /// `≠`
    Ne,
}

impl Cmp {
    /// Apply the comparator.
    pub fn apply(self, a: f64, b: f64) -> bool {
        match self {
            Cmp::Ge => a >= b,
            Cmp::Gt => a > b,
            Cmp::Le => a <= b,
            Cmp::Lt => a < b,
            Cmp::Eq => a == b,
            Cmp::Ne => a != b,
        }
    }

    /// Strict logical negation: `≤`↔`>`, `<`↔`≥`, `=`↔`≠`.
    pub fn negated(self) -> Cmp {
        match self {
            Cmp::Ge => Cmp::Lt,
            Cmp::Gt => Cmp::Le,
            Cmp::Le => Cmp::Gt,
            Cmp::Lt => Cmp::Ge,
            Cmp::Eq => Cmp::Ne,
            Cmp::Ne => Cmp::Eq,
        }
    }

    /// The symmetrical swap used by the progression families: `≤`↔`≥`.
    /// Comparators outside the swap fall back to logical negation.
    pub fn symmetrical(self) -> Cmp {
        match self {
            Cmp::Le => Cmp::Ge,
            Cmp::Ge => Cmp::Le,
            other => other.negated(),
        }
    }

    /// The comparator symbol as it appears in condition labels.
    pub fn symbol(self) -> &'static str {
        match self {
            Cmp::Ge => "≥",
            Cmp::Gt => ">",
            Cmp::Le => "≤",
            Cmp::Lt => "<",
            Cmp::Eq => "=",
            Cmp::Ne => "≠",
        }
    }
}

/// Which day a bar operand is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The screening day.
    Today,
    /// The most recent prior day with data ("DAY-1").
    Prior,
}

/// A bar operand: one hour of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRef {
    /// Day the bar belongs to.
    pub source: Source,
    /// Clock hour of the bar.
    pub hour: u32,
}

/// How the "inverse" toggle of a condition is derived from its comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InversePolicy {
    /// Strict logical negation of the primary comparator.
    Logical,
    /// The symmetrical operator swap (`≤`↔`≥`): a reversed directional
    /// framing where equality satisfies either side.
    Symmetrical,
}

/// A declarative condition predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Two fields of the same bar, e.g. `Close 4h ≥ Open 4h`.
    FieldPair {
        /// Day of the bar.
        source: Source,
        /// Hour of the bar.
        hour: u32,
        /// Left-hand field.
        lhs: Field,
        /// Right-hand field.
        rhs: Field,
        /// Comparator; inverse is always the logical negation.
        cmp: Cmp,
    },
    /// The same field of two bars, e.g. `Low 5h ≤ Low 4h`.
    BarPair {
        /// Left-hand bar.
        lhs: BarRef,
        /// Right-hand bar.
        rhs: BarRef,
        /// Field compared on both bars.
        field: Field,
        /// Comparator.
        cmp: Cmp,
        /// Inverse derivation policy for this condition.
        inverse: InversePolicy,
    },
    /// One bar's field against an extremum over an hour range of today,
    /// e.g. `High 4h ≥ High [4;15]`.
    BarVsRange {
        /// Hour of the bar under test.
        hour: u32,
        /// Field compared.
        field: Field,
        /// Half-open hour range the extremum is taken over.
        hours: Range<u32>,
        /// Max or min.
        agg: Agg,
        /// Comparator; inverse is the logical negation.
        cmp: Cmp,
    },
    /// `Close ≥ Open` of the n-th resolvable bar of the day (0-based).
    NthBarCloseAboveOpen {
        /// Ordinal index of the bar.
        index: usize,
    },
    /// The first resolvable bar of the day falls on the given hour.
    FirstBarAtHour {
        /// Expected hour.
        hour: u32,
    },
    /// Max High over yesterday 16–19h ∪ today 4–19h exceeds
    /// `factor × open16`.
    RangeHighAboveReference {
        /// Reference-price multiplier (1.5 or 1.7).
        factor: f64,
    },
    /// Max High over today 4–19h exceeds `multiplier × Close(prior_hour)`
    /// of the prior day.
    RangeHighAbovePriorClose {
        /// Prior-day hour whose close anchors the threshold.
        prior_hour: u32,
        /// Threshold multiplier.
        multiplier: f64,
    },
}

/// The three data inputs every predicate is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The screening day's samples.
    pub today: DayBars<'a>,
    /// The most recent prior day with data, when one exists.
    pub prior: Option<DayBars<'a>>,
    /// The carried-over 16:00 open of the prior day, when one exists.
    pub reference_open16: Option<f64>,
}

impl EvalContext<'_> {
    fn bar(&self, source: Source, hour: u32) -> Option<HourlyBar> {
        match source {
            Source::Today => bar_at_hour(&self.today, hour),
            Source::Prior => self.prior.as_ref().and_then(|d| bar_at_hour(d, hour)),
        }
    }
}

/// The `(primary, inverse)` outcome of one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateOutcome {
    /// The condition as stated, when computable.
    pub primary: Option<bool>,
    /// The policy-defined opposite, when computable.
    pub inverse: Option<bool>,
}

impl PredicateOutcome {
    const ABSENT: PredicateOutcome = PredicateOutcome {
        primary: None,
        inverse: None,
    };

    fn from_cmp(cmp: Cmp, inverse_cmp: Cmp, a: f64, b: f64) -> Self {
        PredicateOutcome {
            primary: Some(cmp.apply(a, b)),
            inverse: Some(inverse_cmp.apply(a, b)),
        }
    }
}

impl Predicate {
    /// Evaluate against today's bars, the prior day's bars and the
    /// reference price. Absent on both sides whenever any operand is
    /// unresolved — a predicate never fabricates a result from partial
    /// data.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> PredicateOutcome {
        match self {
            Predicate::FieldPair {
                source,
                hour,
                lhs,
                rhs,
                cmp,
            } => match ctx.bar(*source, *hour) {
                Some(bar) => {
                    PredicateOutcome::from_cmp(*cmp, cmp.negated(), lhs.of(&bar), rhs.of(&bar))
                }
                None => PredicateOutcome::ABSENT,
            },
            Predicate::BarPair {
                lhs,
                rhs,
                field,
                cmp,
                inverse,
            } => {
                let (Some(a), Some(b)) = (
                    ctx.bar(lhs.source, lhs.hour),
                    ctx.bar(rhs.source, rhs.hour),
                ) else {
                    return PredicateOutcome::ABSENT;
                };
                let inverse_cmp = match inverse {
                    InversePolicy::Logical => cmp.negated(),
                    InversePolicy::Symmetrical => cmp.symmetrical(),
                };
                PredicateOutcome::from_cmp(*cmp, inverse_cmp, field.of(&a), field.of(&b))
            }
            Predicate::BarVsRange {
                hour,
                field,
                hours,
                agg,
                cmp,
            } => {
                let (Some(bar), Some(stat)) = (
                    ctx.bar(Source::Today, *hour),
                    range_stat(&ctx.today, hours.clone(), *field, *agg),
                ) else {
                    return PredicateOutcome::ABSENT;
                };
                PredicateOutcome::from_cmp(*cmp, cmp.negated(), field.of(&bar), stat)
            }
            Predicate::NthBarCloseAboveOpen { index } => {
                match first_bars(&ctx.today, index + 1).get(*index) {
                    Some((_, bar)) => {
                        PredicateOutcome::from_cmp(Cmp::Ge, Cmp::Lt, bar.close, bar.open)
                    }
                    None => PredicateOutcome::ABSENT,
                }
            }
            Predicate::FirstBarAtHour { hour } => match first_bars(&ctx.today, 1).first() {
                Some((first_hour, _)) => PredicateOutcome {
                    primary: Some(first_hour == hour),
                    inverse: Some(first_hour != hour),
                },
                None => PredicateOutcome::ABSENT,
            },
            Predicate::RangeHighAboveReference { factor } => {
                let Some(open16) = ctx.reference_open16 else {
                    return PredicateOutcome::ABSENT;
                };
                let prior_highs = (16..20)
                    .filter_map(|h| ctx.bar(Source::Prior, h))
                    .map(|b| b.high);
                let today_highs = (4..20)
                    .filter_map(|h| ctx.bar(Source::Today, h))
                    .map(|b| b.high);
                match prior_highs.chain(today_highs).reduce(f64::max) {
                    Some(max_high) => {
                        PredicateOutcome::from_cmp(Cmp::Gt, Cmp::Le, max_high, factor * open16)
                    }
                    None => PredicateOutcome::ABSENT,
                }
            }
            Predicate::RangeHighAbovePriorClose {
                prior_hour,
                multiplier,
            } => {
                let (Some(anchor), Some(max_high)) = (
                    ctx.bar(Source::Prior, *prior_hour),
                    range_stat(&ctx.today, 4..20, Field::High, Agg::Max),
                ) else {
                    return PredicateOutcome::ABSENT;
                };
                PredicateOutcome::from_cmp(Cmp::Gt, Cmp::Le, max_high, multiplier * anchor.close)
            }
        }
    }

    /// The today-bar hours this predicate reads directly. Used by the
    /// evaluator's preflight diagnostics; range extrema and ordinal checks
    /// tolerate gaps and report nothing here.
    pub fn today_hours(&self) -> Vec<u32> {
        match self {
            Predicate::FieldPair {
                source: Source::Today,
                hour,
                ..
            } => vec![*hour],
            Predicate::FieldPair { .. } => Vec::new(),
            Predicate::BarPair { lhs, rhs, .. } => [lhs, rhs]
                .iter()
                .filter(|r| r.source == Source::Today)
                .map(|r| r.hour)
                .collect(),
            Predicate::BarVsRange { hour, .. } => vec![*hour],
            _ => Vec::new(),
        }
    }
}
