//! Screener driver: fetch hourly bars for the configured universe,
//! evaluate the toggled conditions per ticker, write the ranked result
//! file.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use market_data::fetch::{FetchProfile, fetch_all};
use market_data::providers::alpaca::AlpacaProvider;
use screener_core::conditions::Selection;
use screener_core::report::{rank_matches, save_results};
use screener_core::screen::screen_ticker;
use screener_core::series::{MARKET_TZ, PriceSeries, Sample};
use screener_core::slicing::default_screening_date;

use crate::config::MAX_TICKERS;

#[derive(Parser)]
#[command(version, about = "Hourly condition stock screener")]
struct Cli {
    /// Path to the run config (tickers + condition toggles)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Screening date (YYYY-MM-DD). Defaults to today, rolling to the next
    /// business day after 20:00 market time.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Override the result file path from the config
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let run = config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let selection = Selection::from_toggles(
        run.conditions.iter().map(|(key, on)| (key.as_str(), *on)),
    )
    .context("parsing condition toggles")?;

    let mut tickers = run.tickers;
    if tickers.is_empty() {
        bail!("no tickers configured");
    }
    if tickers.len() > MAX_TICKERS {
        warn!(
            configured = tickers.len(),
            cap = MAX_TICKERS,
            "too many tickers; screening the first {MAX_TICKERS} only"
        );
        tickers.truncate(MAX_TICKERS);
    }

    let now = Utc::now().with_timezone(&MARKET_TZ);
    let screening_date = cli.date.unwrap_or_else(|| default_screening_date(now));
    info!(%screening_date, tickers = tickers.len(), "running screener");

    let provider = AlpacaProvider::new().context("initializing market data provider")?;
    let profile = FetchProfile::for_screening_date(screening_date, now.date_naive());
    let fetched = fetch_all(&provider, &tickers, screening_date, profile).await;

    // Per-ticker evaluation is pure and independent; run it across worker
    // threads and put the verdicts back into input order for the serials.
    let selection = Arc::new(selection);
    let mut join = JoinSet::new();
    for (index, (symbol, bars)) in fetched.into_iter().enumerate() {
        let selection = Arc::clone(&selection);
        let samples = bars
            .into_iter()
            .map(|b| Sample::from_utc(b.timestamp, b.open, b.high, b.low, b.close, Some(b.volume)))
            .collect();
        let series = PriceSeries::new(symbol, samples);
        join.spawn_blocking(move || {
            let open16 = screen_ticker(&series, screening_date, &selection);
            (index, series.symbol().to_string(), open16)
        });
    }

    let mut verdicts = Vec::new();
    while let Some(joined) = join.join_next().await {
        verdicts.push(joined.context("evaluation task failed")?);
    }
    verdicts.sort_by_key(|(index, ..)| *index);
    let ordered: Vec<(String, Option<f64>)> = verdicts
        .into_iter()
        .map(|(_, symbol, open16)| (symbol, open16))
        .collect();

    let matches = rank_matches(&ordered);
    let output = cli.output.unwrap_or(run.output);
    save_results(&output, &matches)
        .with_context(|| format!("writing results to {}", output.display()))?;

    info!(
        matches = matches.len(),
        screened = ordered.len(),
        path = %output.display(),
        "screener finished"
    );
    Ok(())
}
