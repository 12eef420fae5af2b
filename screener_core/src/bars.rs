//! Hourly OHLC bar resolution.
//!
//! A bar for hour `H` aggregates every sample in `[H:00, H+1:00)` of one
//! day: Open from the first sample, Close from the last, High/Low as the
//! window extremes. The resolver behaves identically whether the source
//! series is already hourly (single-sample window, pass-through) or finer
//! (true aggregation).
//!
//! A window resolves to an absent bar — never a degenerate zero bar — when:
//! - no sample falls inside it,
//! - any in-window OHLC field is NaN,
//! - the source tracks volume and the window's volume sum is not positive
//!   (non-trading artifacts must not count as evidence).

use chrono::Timelike;

use crate::slicing::DayBars;

/// A fully resolved hourly bar. All four fields are present and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyBar {
    /// First sample's open in the hour window.
    pub open: f64,
    /// Maximum high over the window.
    pub high: f64,
    /// Minimum low over the window.
    pub low: f64,
    /// Last sample's close in the window.
    pub close: f64,
}

/// A bar field selector, for predicates and range statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Opening price.
    Open,
    /// Highest price.
    High,
    /// Lowest price.
    Low,
    /// Closing price.
    Close,
}

impl Field {
    /// Read this field out of a bar.
    pub fn of(self, bar: &HourlyBar) -> f64 {
        match self {
            Field::Open => bar.open,
            Field::High => bar.high,
            Field::Low => bar.low,
            Field::Close => bar.close,
        }
    }

    /// The field name as it appears in condition labels.
    pub fn label(self) -> &'static str {
        match self {
            Field::Open => "Open",
            Field::High => "High",
            Field::Low => "Low",
            Field::Close => "Close",
        }
    }
}

/// Extremum selector for range statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agg {
    /// Maximum over the range.
    Max,
    /// Minimum over the range.
    Min,
}

/// Resolve the canonical bar for one clock hour of the day, or absent.
pub fn bar_at_hour(day: &DayBars<'_>, hour: u32) -> Option<HourlyBar> {
    let window: Vec<_> = day
        .samples
        .iter()
        .filter(|s| s.timestamp.hour() == hour)
        .collect();

    let (first, last) = match (window.first(), window.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return None,
    };

    let mut high = f64::NEG_INFINITY;
    let mut low = f64::INFINITY;
    for s in &window {
        if s.open.is_nan() || s.high.is_nan() || s.low.is_nan() || s.close.is_nan() {
            return None;
        }
        high = high.max(s.high);
        low = low.min(s.low);
    }

    // A volume-tracking window with no traded volume is an artifact, not a bar.
    if window.iter().any(|s| s.volume.is_some()) {
        let sum: f64 = window.iter().map(|s| s.volume.unwrap_or(0.0)).sum();
        if !(sum > 0.0) {
            return None;
        }
    }

    Some(HourlyBar {
        open: first.open,
        high,
        low,
        close: last.close,
    })
}

/// Max or min of a bar field over the bars that resolve in `hours`
/// (half-open hour range); absent when none resolve.
pub fn range_stat(
    day: &DayBars<'_>,
    hours: std::ops::Range<u32>,
    field: Field,
    agg: Agg,
) -> Option<f64> {
    let values = hours.filter_map(|h| bar_at_hour(day, h).map(|b| field.of(&b)));
    match agg {
        Agg::Max => values.reduce(f64::max),
        Agg::Min => values.reduce(f64::min),
    }
}

/// The first `n` resolvable hourly bars of the day, in hour order, paired
/// with the hour they fall on. Fewer than `n` entries when the day is thin.
pub fn first_bars(day: &DayBars<'_>, n: usize) -> Vec<(u32, HourlyBar)> {
    (0..24)
        .filter_map(|h| bar_at_hour(day, h).map(|b| (h, b)))
        .take(n)
        .collect()
}
