//! Headless signal analysis over local OHLCV files
//!
//! Each CSV file is analysed independently (in parallel) and the resulting
//! snapshot is printed to stdout as one JSON document per line.
//!
//! # Usage
//! ```sh
//! RUST_LOG=debug cargo run --bin analyze -- data/btcusdt.csv data/ethusdt.csv
//! ```
//!
//! # Environment Variables
//! Signal parameters (`EMA_FAST_PERIOD`, `RSI_PERIOD`, `MIN_BARS`, ...) and
//! `INDICATOR_BACKEND` (`streaming` | `vector`) are read from the environment
//! or a `.env` file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use wavesignal::application::batch::analyze_batch;
use wavesignal::application::signal_engine::recommendation_counts;
use wavesignal::config::Config;
use wavesignal::infrastructure::load_series;

#[derive(Parser)]
#[command(author, version, about = "Wavelet-MACD multi-factor signal analysis", long_about = None)]
struct Args {
    /// CSV files with header timestamp,open,high,low,close,volume
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Symbol label (defaults to each file's stem; only valid with one file)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Print the whole indicator frame instead of the snapshot
    #[arg(long)]
    frame: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

/// `RUST_LOG` when set, `info` otherwise
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(log_filter())
        .with(stderr_layer)
        .init();

    let args = Args::parse();
    if args.symbol.is_some() && args.files.len() > 1 {
        anyhow::bail!("--symbol can only be used with a single input file");
    }

    let config = Config::from_env()?;
    let aggregator = config.build_aggregator()?;
    info!(
        "wavesignal {} starting: backend={}, min_bars={}, files={}",
        env!("CARGO_PKG_VERSION"),
        aggregator.backend_name(),
        config.signal.min_bars,
        args.files.len()
    );

    let series = args
        .files
        .iter()
        .map(|path| load_series(path, args.symbol.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let mut failures = 0usize;
    for outcome in analyze_batch(&aggregator, &series) {
        match outcome.result {
            Ok(analysis) => {
                let (buys, sells, waits) = recommendation_counts(&analysis.frame);
                info!(
                    "{}: {} (history: {} BUY / {} SELL / {} WAIT)",
                    outcome.symbol, analysis.snapshot.recommendation, buys, sells, waits
                );
                let json = match (args.frame, args.pretty) {
                    (true, true) => serde_json::to_string_pretty(&analysis.frame),
                    (true, false) => serde_json::to_string(&analysis.frame),
                    (false, true) => serde_json::to_string_pretty(&analysis.snapshot),
                    (false, false) => serde_json::to_string(&analysis.snapshot),
                }
                .context("Failed to serialize analysis")?;
                println!("{}", json);
            }
            Err(e) => {
                failures += 1;
                error!("{}: {}", outcome.symbol, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} series could not be analysed", failures, series.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_log_filter_honours_rust_log() {
        // SAFETY: the only test in this binary touching the environment
        unsafe { std::env::set_var("RUST_LOG", "debug") };
        assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::DEBUG));

        unsafe { std::env::remove_var("RUST_LOG") };
        assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::INFO));
    }
}
