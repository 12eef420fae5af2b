//! Hourly market-data fetch layer for the screener.
//!
//! The evaluation core consumes one price series per ticker; this crate
//! produces them: a provider abstraction over market-data vendors, an
//! Alpaca REST implementation, and a batch fetcher with bounded
//! concurrency, request pacing and retry/backoff. Unrecoverable failures
//! surface as an empty bar list per ticker — the core treats that the same
//! as "no data", so one bad symbol never sinks a run.

pub mod env;
pub mod fetch;
pub mod models;
pub mod providers;
