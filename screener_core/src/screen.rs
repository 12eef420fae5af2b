//! Per-ticker screening: slice the day, locate the prior day and the
//! reference price, evaluate the selected conditions.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::conditions::{EvalContext, Selection, evaluate_verdict};
use crate::reference::find_reference_open16;
use crate::series::PriceSeries;
use crate::slicing::{DEFAULT_LOOKBACK_DAYS, day_bars, previous_day_bars};

/// Screen one ticker for `screening_date`.
///
/// Returns the reference 16h open on a pass, `None` otherwise. A ticker
/// whose data cannot support evaluation — empty series, no samples on the
/// screening day, no prior day, no reference price — is skipped with a log
/// line, never an error.
pub fn screen_ticker(
    series: &PriceSeries,
    screening_date: NaiveDate,
    selection: &Selection,
) -> Option<f64> {
    if series.is_empty() {
        warn!(symbol = series.symbol(), "no data fetched; skipping");
        return None;
    }

    let today = day_bars(series, screening_date);
    let prior = previous_day_bars(series, screening_date, DEFAULT_LOOKBACK_DAYS);
    if today.is_empty() || prior.is_none() {
        warn!(
            symbol = series.symbol(),
            %screening_date,
            "missing data on target or previous day; skipping"
        );
        return None;
    }

    let open16 = match find_reference_open16(series, screening_date, DEFAULT_LOOKBACK_DAYS) {
        Some(v) => v,
        None => {
            warn!(symbol = series.symbol(), "no 16h reference open; skipping");
            return None;
        }
    };

    let ctx = EvalContext {
        today,
        prior,
        reference_open16: Some(open16),
    };
    let passed = evaluate_verdict(selection, &ctx);
    info!(symbol = series.symbol(), passed, "ticker screened");
    passed.then_some(open16)
}
