//! Run configuration: the ticker universe and the condition toggles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Soft cap on the screened universe per run.
pub const MAX_TICKERS: usize = 50;

/// Errors while loading the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for a run config.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One screening run, as configured on disk.
///
/// ```toml
/// tickers = ["AAPL", "TSLA"]
/// output = "output/screener_results.txt"
///
/// [conditions]
/// "1" = true
/// "inv_30" = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Tickers to screen, in the order serials will honor.
    pub tickers: Vec<String>,

    /// Result file path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Condition toggle map: `"17"` activates condition 17, `"inv_17"`
    /// its inverse.
    #[serde(default)]
    pub conditions: BTreeMap<String, bool>,
}

fn default_output() -> PathBuf {
    PathBuf::from("output/screener_results.txt")
}

/// Load a run config from a TOML file.
pub fn load(path: &Path) -> Result<RunConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}
