//! The carried-over reference price: the Open of the most recent 16:00-hour
//! bar strictly before the screening date.

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::bars::bar_at_hour;
use crate::series::PriceSeries;
use crate::slicing::day_bars;

/// The hour whose opening price is carried into the threshold conditions.
pub const REFERENCE_HOUR: u32 = 16;

/// Find the reference 16:00 open, walking back from `screening_date - 1`
/// up to `max_lookback` days.
///
/// Each candidate day's hour-16 bar is resolved through the aggregating bar
/// resolver, so sparse sub-hour source data still yields a reference.
/// Absent when the whole window is exhausted — logged, not fatal; the caller
/// excludes the ticker.
pub fn find_reference_open16(
    series: &PriceSeries,
    screening_date: NaiveDate,
    max_lookback: u32,
) -> Option<f64> {
    for delta in 1..=max_lookback as i64 {
        let date = screening_date - Duration::days(delta);
        let day = day_bars(series, date);
        if day.is_empty() {
            continue;
        }
        if let Some(bar) = bar_at_hour(&day, REFERENCE_HOUR) {
            info!(
                symbol = series.symbol(),
                %date,
                open16 = bar.open,
                "found 16h reference open"
            );
            return Some(bar.open);
        }
    }
    warn!(
        symbol = series.symbol(),
        %screening_date,
        lookback_days = max_lookback,
        "no 16h bar found in lookback window"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Sample, localize_naive};
    use crate::slicing::DEFAULT_LOOKBACK_DAYS;
    use chrono::NaiveDate;

    fn sample(date: NaiveDate, hour: u32, minute: u32, open: f64) -> Sample {
        Sample {
            timestamp: localize_naive(date.and_hms_opt(hour, minute, 0).unwrap()).unwrap(),
            open,
            high: open + 1.0,
            low: open - 1.0,
            close: open + 0.5,
            volume: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn takes_most_recent_prior_day_with_a_16h_bar() {
        let series = PriceSeries::new(
            "X",
            vec![
                sample(day(10), 16, 0, 90.0),
                sample(day(12), 16, 0, 100.0),
                // Screening day's own 16h bar must not be considered.
                sample(day(15), 16, 0, 200.0),
            ],
        );
        assert_eq!(
            find_reference_open16(&series, day(15), DEFAULT_LOOKBACK_DAYS),
            Some(100.0)
        );
    }

    #[test]
    fn aggregates_sub_hour_samples_into_the_16h_bar() {
        let series = PriceSeries::new(
            "X",
            vec![
                sample(day(12), 16, 0, 100.0),
                sample(day(12), 16, 30, 101.0),
            ],
        );
        // Open of the aggregate is the first sample's open.
        assert_eq!(
            find_reference_open16(&series, day(13), DEFAULT_LOOKBACK_DAYS),
            Some(100.0)
        );
    }

    #[test]
    fn day_with_data_but_no_16h_bar_keeps_walking() {
        let series = PriceSeries::new(
            "X",
            vec![
                sample(day(12), 16, 0, 100.0),
                // The 14th trades but not during the 16h hour.
                sample(day(14), 10, 0, 50.0),
            ],
        );
        assert_eq!(
            find_reference_open16(&series, day(15), DEFAULT_LOOKBACK_DAYS),
            Some(100.0)
        );
    }

    #[test]
    fn exhausted_window_is_absent() {
        let series = PriceSeries::new("X", vec![sample(day(1), 16, 0, 100.0)]);
        // Seven-day window from the 15th reaches back to the 8th only.
        assert_eq!(
            find_reference_open16(&series, day(15), DEFAULT_LOOKBACK_DAYS),
            None
        );
    }
}
