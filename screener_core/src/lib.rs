//! Hourly condition screening engine.
//!
//! Given one ticker's hourly (or finer) price series, a screening date and a
//! set of toggled conditions, this crate decides whether the ticker's
//! intraday action matches the selected pattern:
//!
//! - [`series`] — the canonical, market-timezone price series.
//! - [`slicing`] — calendar-day slicing and previous-day lookup.
//! - [`bars`] — hourly OHLC bar resolution from raw samples.
//! - [`reference`] — the carried-over 16:00 opening price of the prior day.
//! - [`conditions`] — the 142-condition catalog and the evaluator that
//!   folds toggled conditions into a single verdict.
//! - [`screen`] — per-ticker orchestration of the above.
//! - [`report`] — serial ranking and the tab-separated result file.
//!
//! All missing data is an explicit `None` threaded end-to-end; the engine
//! never raises for an unresolvable bar, day or reference price.

pub mod bars;
pub mod conditions;
pub mod reference;
pub mod report;
pub mod screen;
pub mod series;
pub mod slicing;
