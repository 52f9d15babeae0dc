use crate::domain::errors::SignalError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One OHLCV sample. Timestamp is epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    pub fn new(
        timestamp: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    fn validate(&self) -> Result<(), String> {
        if self.low > self.high {
            return Err(format!(
                "bar {}: low {} above high {}",
                self.timestamp, self.low, self.high
            ));
        }
        for (name, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(format!(
                    "bar {}: {} {} outside [{}, {}]",
                    self.timestamp, name, value, self.low, self.high
                ));
            }
        }
        if self.volume.is_sign_negative() && !self.volume.is_zero() {
            return Err(format!(
                "bar {}: negative volume {}",
                self.timestamp, self.volume
            ));
        }
        Ok(())
    }
}

// Streaming indicators from `ta` consume anything exposing these accessors.
impl ta::Open for Bar {
    fn open(&self) -> f64 {
        self.open.to_f64().unwrap_or(f64::NAN)
    }
}

impl ta::High for Bar {
    fn high(&self) -> f64 {
        self.high.to_f64().unwrap_or(f64::NAN)
    }
}

impl ta::Low for Bar {
    fn low(&self) -> f64 {
        self.low.to_f64().unwrap_or(f64::NAN)
    }
}

impl ta::Close for Bar {
    fn close(&self) -> f64 {
        self.close.to_f64().unwrap_or(f64::NAN)
    }
}

impl ta::Volume for Bar {
    fn volume(&self) -> f64 {
        self.volume.to_f64().unwrap_or(f64::NAN)
    }
}

/// Ordered bars for a single instrument.
///
/// Timestamps are strictly increasing and every bar satisfies
/// `low <= open, close <= high`. The symbol is a label only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawSeries")]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

/// Unchecked wire form; deserialized series go through [`Series::new`]
#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl TryFrom<RawSeries> for Series {
    type Error = SignalError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Series::new(raw.symbol, raw.bars)
    }
}

impl Series {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SignalError> {
        for bar in &bars {
            bar.validate()
                .map_err(|reason| SignalError::InvalidSeries { reason })?;
        }
        if let Some(pair) = bars
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SignalError::InvalidSeries {
                reason: format!(
                    "timestamps not strictly increasing: {} then {}",
                    pair[0].timestamp, pair[1].timestamp
                ),
            });
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Extracts the `f64` columns the indicator math runs on.
    pub fn columns(&self) -> Columns {
        use ta::{Close, High, Low, Open, Volume};

        let mut cols = Columns::with_capacity(self.bars.len());
        for bar in &self.bars {
            cols.timestamp.push(bar.timestamp);
            cols.open.push(bar.open());
            cols.high.push(bar.high());
            cols.low.push(bar.low());
            cols.close.push(bar.close());
            cols.volume.push(bar.volume());
        }
        cols
    }
}

/// Column-oriented view of a [`Series`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Columns {
    pub timestamp: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl Columns {
    fn with_capacity(n: usize) -> Self {
        Self {
            timestamp: Vec::with_capacity(n),
            open: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
            volume: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}
