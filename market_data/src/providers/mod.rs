//! Provider abstraction for market data sources.
//!
//! [`HourlyBarsProvider`] is the unified interface for fetching hourly bar
//! data from any market data vendor. Each concrete provider (such as
//! [`alpaca::AlpacaProvider`]) handles vendor-specific API logic. The trait
//! is async and object-safe, so providers can be selected at runtime behind
//! `dyn HourlyBarsProvider`.

pub mod alpaca;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::env::MissingEnvVar;
use crate::models::bar::Bar;

/// HTTP statuses worth retrying: rate limiting and transient server faults.
pub const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors that can occur while a provider serves a fetch.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (connection, timeout, body decode).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider's API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
}

impl ProviderError {
    /// True when a retry with backoff has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Request(e) => e.is_timeout() || e.is_connect(),
            ProviderError::Http { status, .. } => RETRYABLE_STATUS.contains(status),
        }
    }
}

/// Errors while constructing a provider.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// API credentials are not present in the environment.
    #[error(transparent)]
    MissingCredentials(#[from] MissingEnvVar),

    /// A credential cannot be used as an HTTP header value.
    #[error("invalid API credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Trait for fetching hourly time-series bars from a market data vendor.
#[async_trait]
pub trait HourlyBarsProvider {
    /// Fetch the hourly bars for `symbol` over `[start, end)`, in
    /// chronological order.
    async fn fetch_hourly_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ProviderError>;
}
