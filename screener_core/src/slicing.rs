//! Calendar-day slicing of a price series in market time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::series::{PriceSeries, Sample};

/// How many calendar days backward the previous-day and reference-price
/// searches may walk.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// The screening-date rollover time: past this wall-clock time the default
/// date suggestion moves to the next business day.
const ROLLOVER: NaiveTime = match NaiveTime::from_hms_opt(20, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// The samples of one calendar day, `[00:00, 24:00)` in market time.
///
/// Borrowed out of the series; possibly empty when the day has no data.
#[derive(Debug, Clone, Copy)]
pub struct DayBars<'a> {
    /// The calendar date this slice covers.
    pub date: NaiveDate,
    /// The day's samples, chronological.
    pub samples: &'a [Sample],
}

impl DayBars<'_> {
    /// True when the day has no samples at all.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Extract the slice of `series` belonging to `date`.
///
/// The series is chronological and every timestamp already lives in market
/// time, so a day is a contiguous run located by binary search.
pub fn day_bars(series: &PriceSeries, date: NaiveDate) -> DayBars<'_> {
    let samples = series.samples();
    let lo = samples.partition_point(|s| s.timestamp.date_naive() < date);
    let hi = samples.partition_point(|s| s.timestamp.date_naive() <= date);
    DayBars {
        date,
        samples: &samples[lo..hi],
    }
}

/// Walk `date-1, date-2, …` up to `max_lookback` days and return the first
/// day that has any data; `None` when the whole window is empty.
pub fn previous_day_bars(
    series: &PriceSeries,
    date: NaiveDate,
    max_lookback: u32,
) -> Option<DayBars<'_>> {
    (1..=max_lookback as i64)
        .map(|delta| day_bars(series, date - Duration::days(delta)))
        .find(|day| !day.is_empty())
}

/// Default screening-date suggestion for "now".
///
/// After the 20:00 market-time rollover the suggestion moves to the next
/// business day. This is a convenience default only — any explicit date is
/// acceptable to the engine.
pub fn default_screening_date(now: DateTime<Tz>) -> NaiveDate {
    if now.time() > ROLLOVER {
        next_business_day(now.date_naive())
    } else {
        now.date_naive()
    }
}

fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut d = date + Duration::days(1);
    while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
        d += Duration::days(1);
    }
    d
}
