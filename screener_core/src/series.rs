//! Canonical in-memory representation of one ticker's price series.
//!
//! Samples are held in the market timezone (US Eastern) because every day
//! and hour boundary in the engine is an Eastern wall-clock boundary.
//! Aware timestamps are converted on the way in; naive timestamps are
//! localized with a deterministic DST policy (earliest instant on fall-back
//! ambiguity, absent on a spring-forward gap).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc, offset::LocalResult};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// The fixed reference timezone for all day/hour boundary computations.
pub const MARKET_TZ: Tz = New_York;

/// A single timestamped OHLC(V) sample, at any granularity up to one hour.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Sample timestamp in the market timezone.
    pub timestamp: DateTime<Tz>,
    /// Opening price.
    pub open: f64,
    /// Highest price over the sample interval.
    pub high: f64,
    /// Lowest price over the sample interval.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Volume traded over the sample interval. Not all sources supply this.
    pub volume: Option<f64>,
}

impl Sample {
    /// Build a sample from a UTC timestamp, converting into market time.
    pub fn from_utc(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Self {
        Self {
            timestamp: timestamp.with_timezone(&MARKET_TZ),
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// One ticker's chronological price series for a screening run.
///
/// Constructed once from an external fetch, read-only thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    samples: Vec<Sample>,
}

impl PriceSeries {
    /// Build a series, sorting samples chronologically.
    ///
    /// Duplicate timestamps are kept in their incoming relative order; they
    /// are not expected but must not break resolution downstream.
    pub fn new(symbol: impl Into<String>, mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self {
            symbol: symbol.into(),
            samples,
        }
    }

    /// The ticker symbol this series belongs to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The chronologically ordered samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// True if the fetch produced no usable data for this ticker.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Localize a naive market-time timestamp.
///
/// Fall-back ambiguity resolves to the earliest instant; a spring-forward
/// gap has no instant and yields `None`.
pub fn localize_naive(naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match MARKET_TZ.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}
