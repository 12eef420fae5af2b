//! Alpaca Market Data REST provider.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::env::get_env_var;
use crate::models::bar::Bar;
use crate::providers::{HourlyBarsProvider, ProviderError, ProviderInitError};

const BASE_URL: &str = "https://data.alpaca.markets/v2/stocks/bars";
const PAGE_LIMIT: u32 = 10_000;

/// A bar as Alpaca serializes it, short field names and all.
#[derive(Deserialize, Debug)]
struct AlpacaBar {
    #[serde(rename = "t")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v")]
    volume: f64,
    #[serde(rename = "n")]
    trade_count: u64,
    #[serde(rename = "vw")]
    vwap: f64,
}

#[derive(Deserialize, Debug)]
struct AlpacaResponse {
    #[serde(default)]
    bars: IndexMap<String, Vec<AlpacaBar>>,
    next_page_token: Option<String>,
}

/// REST provider over Alpaca's stock bars endpoint.
pub struct AlpacaProvider {
    client: Client,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables; they are sent as default headers on every
    /// request.
    pub fn new() -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(get_env_var("APCA_API_KEY_ID")?.into());
        let secret_key = SecretString::new(get_env_var("APCA_API_SECRET_KEY")?.into());

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(api_key.expose_secret())?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(secret_key.expose_secret())?,
        );

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HourlyBarsProvider for AlpacaProvider {
    async fn fetch_hourly_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ProviderError> {
        let mut all_bars: Vec<AlpacaBar> = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("symbols", symbol.to_string()),
                ("timeframe", "1Hour".to_string()),
                ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("limit", PAGE_LIMIT.to_string()),
                ("adjustment", "raw".to_string()),
            ];
            if let Some(token) = &next_page_token {
                query.push(("page_token", token.clone()));
            }

            let response = self.client.get(BASE_URL).query(&query).send().await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown API error".to_string());
                return Err(ProviderError::Http { status, message });
            }

            let mut page = response.json::<AlpacaResponse>().await?;

            // Merge this page's bars for our symbol into the collection.
            if let Some(bars) = page.bars.swap_remove(symbol) {
                all_bars.extend(bars);
            }

            match page.next_page_token {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        Ok(all_bars
            .into_iter()
            .map(|ab| Bar {
                timestamp: ab.timestamp,
                open: ab.open,
                high: ab.high,
                low: ab.low,
                close: ab.close,
                volume: ab.volume,
                trade_count: Some(ab.trade_count),
                vwap: Some(ab.vwap),
            })
            .collect())
    }
}
