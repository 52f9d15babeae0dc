//! OHLCV series loaded from CSV files.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. The timestamp is
//! either epoch milliseconds or an RFC 3339 / `YYYY-MM-DD HH:MM:SS` (UTC) string.

use crate::domain::market::{Bar, Series};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn to_millis(&self) -> Result<i64> {
        match self {
            RawTimestamp::Millis(ms) => Ok(*ms),
            RawTimestamp::Text(text) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Ok(dt.timestamp_millis());
                }
                let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                    .with_context(|| format!("Unrecognized timestamp '{}'", text))?;
                Ok(naive.and_utc().timestamp_millis())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: RawTimestamp,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

pub fn read_series<R: Read>(reader: R, symbol: &str) -> Result<Series> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let record: BarRecord =
            result.with_context(|| format!("Malformed bar on data row {}", line + 1))?;
        bars.push(Bar::new(
            record.timestamp.to_millis()?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }
    if bars.is_empty() {
        bail!("No bars found for {}", symbol);
    }

    Ok(Series::new(symbol, bars)?)
}

/// Loads a series from disk. The symbol defaults to the file stem.
pub fn load_series(path: &Path, symbol: Option<&str>) -> Result<Series> {
    let symbol = match symbol {
        Some(s) => s.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
    };
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    read_series(BufReader::new(file), &symbol).with_context(|| format!("Failed to load {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reads_millis_timestamps() {
        let data = "timestamp,open,high,low,close,volume\n\
                    1700000000000,100.0,101.5,99.5,101.0,1200\n\
                    1700000060000,101.0,102.0,100.5,101.8,900.5\n";
        let series = read_series(data.as_bytes(), "BTCUSDT").unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "BTCUSDT");
        let last = series.last().unwrap();
        assert_eq!(last.timestamp, 1_700_000_060_000);
        assert_eq!(last.close, dec!(101.8));
        assert_eq!(last.volume, dec!(900.5));
    }

    #[test]
    fn test_reads_text_timestamps() {
        let data = "timestamp,open,high,low,close,volume\n\
                    2024-01-02 00:00:00,10,11,9,10.5,5\n\
                    2024-01-02T00:01:00Z,10.5,11,10,10.8,6\n";
        let series = read_series(data.as_bytes(), "X").unwrap();
        assert_eq!(series.bars()[1].timestamp - series.bars()[0].timestamp, 60_000);
    }

    #[test]
    fn test_rejects_invalid_rows() {
        let data = "timestamp,open,high,low,close,volume\n1,abc,1,1,1,1\n";
        assert!(read_series(data.as_bytes(), "X").is_err());

        let unordered = "timestamp,open,high,low,close,volume\n2,1,1,1,1,1\n1,1,1,1,1,1\n";
        let err = read_series(unordered.as_bytes(), "X").unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let data = "timestamp,open,high,low,close,volume\n";
        assert!(read_series(data.as_bytes(), "X").is_err());
    }
}
