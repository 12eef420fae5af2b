//! Serial ranking and the tab-separated result file.
//!
//! Serials are assigned from input-ticker order after every verdict is
//! known, so concurrent evaluation order never changes the output.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

/// One matching ticker in the result file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerMatch {
    /// 1-based rank among the matches, in input-ticker order.
    pub serial: usize,
    /// 1-based position of the ticker in the screened universe.
    pub ticker_no: usize,
    /// Ticker symbol.
    pub ticker: String,
    /// The carried-over 16h open recorded with the match.
    pub reference_open16: f64,
}

/// Assign serials to the passing tickers.
///
/// `verdicts` holds one entry per screened ticker in input order: the
/// symbol and, for a pass, its reference open. The deterministic input
/// order is the tie-break; completion order of concurrent evaluation does
/// not matter.
pub fn rank_matches(verdicts: &[(String, Option<f64>)]) -> Vec<ScreenerMatch> {
    verdicts
        .iter()
        .enumerate()
        .filter_map(|(index, (ticker, open16))| {
            open16.map(|reference_open16| (index, ticker, reference_open16))
        })
        .enumerate()
        .map(|(rank, (index, ticker, reference_open16))| ScreenerMatch {
            serial: rank + 1,
            ticker_no: index + 1,
            ticker: ticker.clone(),
            reference_open16,
        })
        .collect()
}

/// Write the result rows, header first, sorted by serial ascending.
pub fn write_results<W: Write>(mut w: W, matches: &[ScreenerMatch]) -> io::Result<()> {
    let mut rows: Vec<&ScreenerMatch> = matches.iter().collect();
    rows.sort_by_key(|m| m.serial);

    writeln!(w, "Serial\tTickerNo\tTicker\tOpen16hDay-1")?;
    for m in rows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            m.serial, m.ticker_no, m.ticker, m.reference_open16
        )?;
    }
    Ok(())
}

/// Write the result file at `path`, creating parent directories as needed.
pub fn save_results(path: &Path, matches: &[ScreenerMatch]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = BufWriter::new(File::create(path)?);
    write_results(&mut file, matches)?;
    file.flush()?;
    info!(path = %path.display(), matches = matches.len(), "results saved");
    Ok(())
}
