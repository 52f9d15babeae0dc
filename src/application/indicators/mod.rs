//! Conventional technical indicators behind a pluggable backend.
//!
//! Two interchangeable implementations of [`IndicatorBackend`] are provided:
//! [`StreamingBackend`] replays the columns through the `ta` crate one
//! sample at a time, [`VectorBackend`] computes whole arrays at once. Both
//! follow the same warm-up and smoothing conventions.

pub mod streaming;
pub mod vector;

pub use streaming::{StreamingBackend, WilderAdx, WilderAtr};
pub use vector::VectorBackend;

use crate::domain::errors::SignalError;
use crate::domain::market::Columns;
use crate::domain::ports::IndicatorBackend;
use crate::domain::signals::SignalConfig;
use std::str::FromStr;
use std::sync::Arc;

/// Selects an [`IndicatorBackend`] implementation by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Streaming,
    Vector,
}

impl BackendKind {
    pub fn build(self) -> Arc<dyn IndicatorBackend> {
        match self {
            BackendKind::Streaming => Arc::new(StreamingBackend),
            BackendKind::Vector => Arc::new(VectorBackend),
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "streaming" | "ta" => Ok(BackendKind::Streaming),
            "vector" | "vectorized" => Ok(BackendKind::Vector),
            _ => anyhow::bail!(
                "Invalid INDICATOR_BACKEND: {}. Must be 'streaming' or 'vector'",
                s
            ),
        }
    }
}

/// Trend, momentum, strength, volatility and volume columns of a series
#[derive(Debug, Clone, PartialEq)]
pub struct CoreIndicators {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub rsi: Vec<f64>,
    pub adx: Vec<f64>,
    pub atr: Vec<f64>,
    pub volume_sma: Vec<f64>,
}

pub fn compute_core_indicators(
    backend: &dyn IndicatorBackend,
    cols: &Columns,
    config: &SignalConfig,
) -> Result<CoreIndicators, SignalError> {
    let indicators = CoreIndicators {
        ema_fast: backend.ema(&cols.close, config.ema_fast_period)?,
        ema_slow: backend.ema(&cols.close, config.ema_slow_period)?,
        rsi: backend.rsi(&cols.close, config.rsi_period)?,
        adx: backend.adx(&cols.high, &cols.low, &cols.close, config.adx_period)?,
        atr: backend.atr(&cols.high, &cols.low, &cols.close, config.atr_period)?,
        volume_sma: backend.sma(&cols.volume, config.volume_sma_period)?,
    };

    tracing::debug!(
        backend = backend.name(),
        bars = cols.len(),
        "Core indicators computed"
    );
    Ok(indicators)
}
