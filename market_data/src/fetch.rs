//! Batch fetching with bounded concurrency, pacing and retry/backoff.
//!
//! Mirrors what the screening run needs from its data vendor: for every
//! ticker, hourly bars covering the screening day, the prior day, and
//! enough history to recover the 16h reference price. A symbol that cannot
//! be fetched after the retry ceiling yields an empty bar list; the
//! evaluation core treats that as "no data for this ticker".

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use futures::StreamExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use nonzero_ext::nonzero;
use tracing::{debug, info, warn};

use crate::models::bar::Bar;
use crate::providers::HourlyBarsProvider;

/// Concurrent in-flight fetches per run.
pub const MAX_CONCURRENCY: usize = 3;

/// Screening dates further back than this use the archive profile.
const ARCHIVE_AGE_DAYS: i64 = 30;

/// The fetch window closes at 11:00 market time on the day after the
/// screening date, covering the full extended session of the target day.
const WINDOW_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(11, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// How aggressively a run fetches, chosen once per run from how far in the
/// past the screening date lies. An explicit value passed into the fetch —
/// never process-wide mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchProfile {
    /// Recent screening date: a short history window, quick retries.
    Recent,
    /// Screening date deep in the past: wider window, more patient retries.
    Archive,
}

impl FetchProfile {
    /// Pick the profile for a run.
    pub fn for_screening_date(screening_date: NaiveDate, today: NaiveDate) -> Self {
        if today.signed_duration_since(screening_date).num_days() > ARCHIVE_AGE_DAYS {
            FetchProfile::Archive
        } else {
            FetchProfile::Recent
        }
    }

    /// Calendar days of history to request. The screening day plus the
    /// prior day plus reference-price slack; the archive profile widens to
    /// the full reference lookback.
    pub fn duration_days(self) -> i64 {
        match self {
            FetchProfile::Recent => 3,
            FetchProfile::Archive => 8,
        }
    }

    /// Retry policy for this profile.
    pub fn retry(self) -> RetryPolicy {
        match self {
            FetchProfile::Recent => RetryPolicy {
                max_retries: 2,
                backoff_base: 2.0,
            },
            FetchProfile::Archive => RetryPolicy {
                max_retries: 4,
                backoff_base: 2.0,
            },
        }
    }
}

/// Retry ceiling and exponential backoff for one symbol's fetch.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts after the first; the ceiling on retries.
    pub max_retries: u32,
    /// Backoff is `backoff_base ^ (attempt - 1)` seconds.
    pub backoff_base: f64,
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_base.powi(attempt as i32 - 1))
    }
}

/// The UTC fetch window for a screening date under a profile: closes at
/// 11:00 market time the day after, opens `duration_days` earlier.
pub fn fetch_window(screening_date: NaiveDate, profile: FetchProfile) -> (DateTime<Utc>, DateTime<Utc>) {
    let close_local = (screening_date + chrono::Duration::days(1)).and_time(WINDOW_CLOSE);
    // 11:00 never falls inside a DST transition.
    let end = New_York
        .from_local_datetime(&close_local)
        .earliest()
        .expect("window close must exist in market time")
        .with_timezone(&Utc);
    let start = end - chrono::Duration::days(profile.duration_days());
    (start, end)
}

/// Fetch hourly bars for every symbol, bounded and paced, retrying
/// transient failures up to the profile's ceiling.
///
/// The returned map preserves the input symbol order regardless of
/// completion order; failed symbols map to an empty bar list.
pub async fn fetch_all<P>(
    provider: &P,
    symbols: &[String],
    screening_date: NaiveDate,
    profile: FetchProfile,
) -> IndexMap<String, Vec<Bar>>
where
    P: HourlyBarsProvider + Sync,
{
    let (start, end) = fetch_window(screening_date, profile);
    info!(%start, %end, ?profile, symbols = symbols.len(), "fetching hourly bars");

    // Two requests per second across the batch, vendor-friendly pacing.
    let limiter = RateLimiter::direct(Quota::per_second(nonzero!(2u32)));
    let retry = profile.retry();

    let fetched: Vec<(String, Vec<Bar>)> = futures::stream::iter(symbols)
        .map(|symbol| {
            let limiter = &limiter;
            async move {
                let bars = fetch_one(provider, limiter, symbol, start, end, retry).await;
                (symbol.clone(), bars)
            }
        })
        .buffer_unordered(MAX_CONCURRENCY)
        .collect()
        .await;

    // Re-establish the deterministic input order.
    let mut by_symbol: IndexMap<String, Vec<Bar>> = fetched.into_iter().collect();
    let mut results = IndexMap::with_capacity(symbols.len());
    for symbol in symbols {
        let bars = by_symbol.swap_remove(symbol).unwrap_or_default();
        results.insert(symbol.clone(), bars);
    }

    let ok = results.values().filter(|bars| !bars.is_empty()).count();
    info!(
        ok,
        ko = results.len() - ok,
        total = results.len(),
        "fetch done"
    );
    results
}

async fn fetch_one<P>(
    provider: &P,
    limiter: &DefaultDirectRateLimiter,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    retry: RetryPolicy,
) -> Vec<Bar>
where
    P: HourlyBarsProvider + Sync,
{
    let mut attempt = 0u32;
    loop {
        limiter.until_ready().await;
        match provider.fetch_hourly_bars(symbol, start, end).await {
            Ok(bars) => {
                if attempt > 0 {
                    debug!(symbol, attempts = attempt + 1, "fetch succeeded after retry");
                }
                return bars;
            }
            Err(e) => {
                attempt += 1;
                if e.is_retryable() && attempt <= retry.max_retries {
                    let delay = retry.backoff(attempt);
                    warn!(
                        symbol,
                        attempt,
                        max_retries = retry.max_retries,
                        error = %e,
                        backoff_secs = delay.as_secs_f64(),
                        "retrying fetch"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                warn!(symbol, error = %e, "fetch failed; symbol yields no data");
                return Vec::new();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::providers::ProviderError;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(ts: DateTime<Utc>) -> Bar {
        Bar {
            timestamp: ts,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 100.0,
            trade_count: None,
            vwap: None,
        }
    }

    /// Fails the first `failures` calls with the given status, then serves
    /// one bar per call.
    struct FlakyProvider {
        failures: u32,
        status: u16,
        calls: AtomicU32,
    }

    #[async_trait]
    impl HourlyBarsProvider for FlakyProvider {
        async fn fetch_hourly_bars(
            &self,
            _symbol: &str,
            start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<Bar>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ProviderError::Http {
                    status: self.status,
                    message: "flaky".to_string(),
                })
            } else {
                Ok(vec![bar(start)])
            }
        }
    }

    #[test]
    fn window_close_is_11am_market_time() {
        // Winter (EST, UTC-5): 11:00 local = 16:00Z on the day after.
        let (_, end) = fetch_window(day(2024, 1, 15), FetchProfile::Recent);
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 16, 16, 0, 0).unwrap());

        // Summer (EDT, UTC-4): 11:00 local = 15:00Z.
        let (_, end) = fetch_window(day(2024, 7, 15), FetchProfile::Recent);
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 7, 16, 15, 0, 0).unwrap());
    }

    #[test]
    fn window_width_follows_the_profile() {
        let (start, end) = fetch_window(day(2024, 1, 15), FetchProfile::Recent);
        assert_eq!(end - start, chrono::Duration::days(3));
        let (start, end) = fetch_window(day(2024, 1, 15), FetchProfile::Archive);
        assert_eq!(end - start, chrono::Duration::days(8));
    }

    #[test]
    fn profile_selection_by_age() {
        let today = day(2024, 6, 1);
        assert_eq!(
            FetchProfile::for_screening_date(day(2024, 5, 20), today),
            FetchProfile::Recent
        );
        assert_eq!(
            FetchProfile::for_screening_date(day(2024, 1, 2), today),
            FetchProfile::Archive
        );
        // A future date (next-business-day suggestion) is recent.
        assert_eq!(
            FetchProfile::for_screening_date(day(2024, 6, 3), today),
            FetchProfile::Recent
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_to_success() {
        let provider = FlakyProvider {
            failures: 2,
            status: 503,
            calls: AtomicU32::new(0),
        };
        let symbols = vec!["AAPL".to_string()];
        let results = fetch_all(&provider, &symbols, day(2024, 1, 15), FetchProfile::Recent).await;
        assert_eq!(results["AAPL"].len(), 1);
        // Initial attempt plus two retries.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_ceiling_yields_empty_series() {
        let provider = FlakyProvider {
            failures: u32::MAX,
            status: 503,
            calls: AtomicU32::new(0),
        };
        let symbols = vec!["AAPL".to_string()];
        let results = fetch_all(&provider, &symbols, day(2024, 1, 15), FetchProfile::Recent).await;
        assert!(results["AAPL"].is_empty());
        // Initial attempt plus MAX_RETRIES of the recent profile.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let provider = FlakyProvider {
            failures: u32::MAX,
            status: 401,
            calls: AtomicU32::new(0),
        };
        let symbols = vec!["AAPL".to_string()];
        let results = fetch_all(&provider, &symbols, day(2024, 1, 15), FetchProfile::Recent).await;
        assert!(results["AAPL"].is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_preserves_input_order_with_failures_inline() {
        // Every symbol succeeds immediately; order must match the input
        // even though completion order is unordered.
        let provider = FlakyProvider {
            failures: 0,
            status: 503,
            calls: AtomicU32::new(0),
        };
        let symbols: Vec<String> = ["TSLA", "AAPL", "NVDA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = fetch_all(&provider, &symbols, day(2024, 1, 15), FetchProfile::Recent).await;
        let got: Vec<&String> = results.keys().collect();
        assert_eq!(got, vec!["TSLA", "AAPL", "NVDA"]);
    }
}
