//! Folding toggled conditions into one verdict per ticker.
//!
//! The evaluator runs preflight diagnostics, drops contradictory
//! selections, evaluates each requested condition in isolation and ANDs the
//! resolved outcomes. Conditions that cannot be computed are excluded from
//! the fold rather than counted as failures — except that a non-empty
//! selection where *nothing* could be evaluated fails the ticker outright,
//! so total absence of evidence never passes.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, warn};

use crate::bars::bar_at_hour;
use crate::conditions::catalog::{CATALOG, ConditionId};
use crate::conditions::predicate::EvalContext;

/// A malformed condition toggle key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// The key is neither an id nor `inv_` + id.
    #[error("unrecognized condition key: {0:?}")]
    BadKey(String),
}

/// Which conditions are active, in primary and/or inverse form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    primary: BTreeSet<ConditionId>,
    inverse: BTreeSet<ConditionId>,
}

impl Selection {
    /// An empty selection (no constraint).
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a condition's primary form.
    pub fn select(mut self, id: ConditionId) -> Self {
        self.primary.insert(id);
        self
    }

    /// Activate a condition's inverse form.
    pub fn select_inverse(mut self, id: ConditionId) -> Self {
        self.inverse.insert(id);
        self
    }

    /// Parse the external toggle map: `"17" → true` activates condition 17,
    /// `"inv_17" → true` activates its inverse; false toggles are ignored.
    pub fn from_toggles<'a, I>(toggles: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut selection = Selection::new();
        for (key, on) in toggles {
            let (inverse, id_str) = match key.strip_prefix("inv_") {
                Some(rest) => (true, rest),
                None => (false, key),
            };
            let id: ConditionId = id_str
                .parse()
                .map_err(|_| SelectionError::BadKey(key.to_string()))?;
            if !on {
                continue;
            }
            if inverse {
                selection.inverse.insert(id);
            } else {
                selection.primary.insert(id);
            }
        }
        Ok(selection)
    }

    /// True when nothing is toggled at all.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.inverse.is_empty()
    }

    /// Ids selected in both forms at once; such selections carry no
    /// information and are dropped by the evaluator.
    fn contradictions(&self) -> Vec<ConditionId> {
        self.primary.intersection(&self.inverse).copied().collect()
    }
}

/// The activated form of a condition, keyed the way the external toggle
/// map keys it.
fn outcome_key(id: ConditionId, inverse: bool) -> String {
    if inverse {
        format!("inv_{id}")
    } else {
        id.to_string()
    }
}

/// The result of evaluating a selection against one ticker's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The folded pass/fail decision.
    pub verdict: bool,
    /// Resolved outcome per activated form (`"17"` / `"inv_17"`).
    pub outcomes: BTreeMap<String, bool>,
    /// Activated forms that could not be computed from the available data.
    pub unresolved: Vec<String>,
    /// Ids dropped because both forms were selected simultaneously.
    pub contradictions: Vec<ConditionId>,
}

/// Evaluate a selection and return the full breakdown.
pub fn evaluate(selection: &Selection, ctx: &EvalContext<'_>) -> Evaluation {
    // No constraint: pass without touching the data.
    if selection.is_empty() {
        debug!("no conditions selected");
        return Evaluation {
            verdict: true,
            outcomes: BTreeMap::new(),
            unresolved: Vec::new(),
            contradictions: Vec::new(),
        };
    }

    // Contradictory double-activations are dropped, both sides.
    let contradictions = selection.contradictions();
    if !contradictions.is_empty() {
        warn!(
            ids = ?contradictions,
            "condition selected in both primary and inverse form; dropping both"
        );
    }
    let dropped: BTreeSet<ConditionId> = contradictions.iter().copied().collect();
    let requested: Vec<(ConditionId, bool)> = selection
        .primary
        .iter()
        .map(|&id| (id, false))
        .chain(selection.inverse.iter().map(|&id| (id, true)))
        .filter(|(id, _)| !dropped.contains(id))
        .collect();

    if requested.is_empty() {
        // Everything contradicted away: equivalent to selecting nothing.
        return Evaluation {
            verdict: true,
            outcomes: BTreeMap::new(),
            unresolved: Vec::new(),
            contradictions,
        };
    }

    preflight(&requested, ctx);

    let mut outcomes = BTreeMap::new();
    let mut unresolved = Vec::new();
    for &(id, inverse) in &requested {
        let key = outcome_key(id, inverse);
        let Some(cond) = CATALOG.get(&id) else {
            warn!(id, "no predicate registered for condition");
            unresolved.push(key);
            continue;
        };
        let pair = cond.predicate.evaluate(ctx);
        // A predicate that states no inverse still inverts logically as
        // long as its primary resolved.
        let value = if inverse {
            pair.inverse.or(pair.primary.map(|p| !p))
        } else {
            pair.primary
        };
        match value {
            Some(v) => {
                outcomes.insert(key, v);
            }
            None => {
                debug!(key = %key, "condition not evaluable");
                unresolved.push(key);
            }
        }
    }

    let verdict = if outcomes.is_empty() {
        // Selections exist but nothing could be evaluated: exclude.
        warn!("no selected condition could be evaluated; excluding ticker");
        false
    } else {
        outcomes.values().all(|&v| v)
    };

    Evaluation {
        verdict,
        outcomes,
        unresolved,
        contradictions,
    }
}

/// Evaluate a selection down to the single pass/fail verdict.
pub fn evaluate_verdict(selection: &Selection, ctx: &EvalContext<'_>) -> bool {
    evaluate(selection, ctx).verdict
}

/// Diagnostic pass: report today-hours the requested conditions read that
/// do not resolve. Never blocks evaluation.
fn preflight(requested: &[(ConditionId, bool)], ctx: &EvalContext<'_>) {
    let needed: BTreeSet<u32> = requested
        .iter()
        .filter_map(|(id, _)| CATALOG.get(id))
        .flat_map(|cond| cond.predicate.today_hours())
        .collect();
    let missing: Vec<u32> = needed
        .into_iter()
        .filter(|&h| bar_at_hour(&ctx.today, h).is_none())
        .collect();
    if !missing.is_empty() {
        debug!(hours = ?missing, "selected conditions need hours missing from today's data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{PriceSeries, Sample, localize_naive};
    use crate::slicing::{day_bars, previous_day_bars};
    use chrono::NaiveDate;

    const TODAY: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 15) {
        Some(d) => d,
        None => unreachable!(),
    };

    fn sample(date: NaiveDate, hour: u32, o: f64, h: f64, l: f64, c: f64) -> Sample {
        Sample {
            timestamp: localize_naive(date.and_hms_opt(hour, 0, 0).unwrap()).unwrap(),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: None,
        }
    }

    fn ctx<'a>(series: &'a PriceSeries, open16: Option<f64>) -> EvalContext<'a> {
        EvalContext {
            today: day_bars(series, TODAY),
            prior: previous_day_bars(series, TODAY, 7),
            reference_open16: open16,
        }
    }

    fn empty_series() -> PriceSeries {
        PriceSeries::new("X", Vec::new())
    }

    #[test]
    fn empty_selection_passes_even_without_data() {
        let series = empty_series();
        let eval = evaluate(&Selection::new(), &ctx(&series, None));
        assert!(eval.verdict);
        assert!(eval.outcomes.is_empty());
    }

    #[test]
    fn all_absent_fails_when_something_is_selected() {
        let series = empty_series();
        let selection = Selection::new().select(3).select_inverse(12);
        let eval = evaluate(&selection, &ctx(&series, None));
        assert!(!eval.verdict);
        assert!(eval.outcomes.is_empty());
        assert_eq!(eval.unresolved, vec!["3".to_string(), "inv_12".to_string()]);
    }

    #[test]
    fn contradiction_dropout_matches_selecting_neither() {
        let series = empty_series();
        let selection = Selection::new().select(3).select_inverse(3);
        let eval = evaluate(&selection, &ctx(&series, None));
        assert!(eval.verdict);
        assert_eq!(eval.contradictions, vec![3]);
        assert!(eval.outcomes.is_empty());

        let neither = evaluate(&Selection::new(), &ctx(&series, None));
        assert_eq!(eval.verdict, neither.verdict);
        assert_eq!(eval.outcomes, neither.outcomes);
    }

    #[test]
    fn prior_day_close_above_open_contributes_true() {
        // DAY-1 hour 18: Open=10, Close=12 → condition 1 primary true.
        let prior = TODAY - chrono::Duration::days(1);
        let series = PriceSeries::new("X", vec![sample(prior, 18, 10.0, 12.5, 9.5, 12.0)]);
        let eval = evaluate(&Selection::new().select(1), &ctx(&series, None));
        assert!(eval.verdict);
        assert_eq!(eval.outcomes.get("1"), Some(&true));
    }

    #[test]
    fn unresolvable_condition_is_excluded_from_the_fold() {
        // Hour 13 resolves (Close ≥ Open → condition 12 true); hour 10 has
        // no samples, so condition 9 (Close 10h ≥ Open 10h) drops out and
        // the verdict rides on condition 12 alone.
        let series = PriceSeries::new("X", vec![sample(TODAY, 13, 10.0, 11.0, 9.5, 10.5)]);
        let selection = Selection::new().select(9).select(12);
        let eval = evaluate(&selection, &ctx(&series, None));
        assert!(eval.verdict);
        assert_eq!(eval.outcomes.get("12"), Some(&true));
        assert_eq!(eval.unresolved, vec!["9".to_string()]);
    }

    #[test]
    fn inverse_activation_uses_policy_inverse() {
        // Condition 17 (Close 18h ≥ Open 18h): falling bar → inverse true.
        let series = PriceSeries::new("X", vec![sample(TODAY, 18, 12.0, 12.5, 9.5, 10.0)]);
        let eval = evaluate(&Selection::new().select_inverse(17), &ctx(&series, None));
        assert!(eval.verdict);
        assert_eq!(eval.outcomes.get("inv_17"), Some(&true));
    }

    #[test]
    fn reference_factor_scenario() {
        // Composite max High = 151, open16 = 100: condition 124 (×1.5)
        // passes, 125 (×1.7) fails, and selecting both fails the ticker.
        let series = PriceSeries::new("X", vec![sample(TODAY, 10, 150.0, 151.0, 149.0, 150.5)]);
        let context = ctx(&series, Some(100.0));

        let eval_124 = evaluate(&Selection::new().select(124), &context);
        assert!(eval_124.verdict);

        let eval_125 = evaluate(&Selection::new().select(125), &context);
        assert!(!eval_125.verdict);
        assert_eq!(eval_125.outcomes.get("125"), Some(&false));

        let both = evaluate(&Selection::new().select(124).select(125), &context);
        assert!(!both.verdict);
    }

    #[test]
    fn unknown_condition_id_is_isolated() {
        let series = PriceSeries::new("X", vec![sample(TODAY, 13, 10.0, 11.0, 9.5, 10.5)]);
        let selection = Selection::new().select(12).select(999);
        let eval = evaluate(&selection, &ctx(&series, None));
        assert!(eval.verdict);
        assert_eq!(eval.unresolved, vec!["999".to_string()]);
    }

    #[test]
    fn toggle_parsing_roundtrip() {
        let toggles = [("1", true), ("inv_30", true), ("17", false), ("inv_2", false)];
        let parsed = Selection::from_toggles(toggles).unwrap();
        assert_eq!(parsed, Selection::new().select(1).select_inverse(30));
    }

    #[test]
    fn malformed_toggle_key_is_rejected() {
        let err = Selection::from_toggles([("abc", true)]).unwrap_err();
        assert_eq!(err, SelectionError::BadKey("abc".to_string()));
        assert!(Selection::from_toggles([("inv_x", false)]).is_err());
    }
}
