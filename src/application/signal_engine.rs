use crate::application::grid::{compute_grid, grid_signal};
use crate::application::indicators::{StreamingBackend, compute_core_indicators};
use crate::application::macd::{compute_wavelet_macd, macd_cross, optimize_macd_params};
use crate::domain::errors::{ConfigError, SignalError};
use crate::domain::market::Series;
use crate::domain::ports::IndicatorBackend;
use crate::domain::signals::{
    Analysis, IndicatorFrame, Recommendation, RiskLevels, SignalConfig, SignalFlags,
    SignalSnapshot,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Multi-factor signal engine.
///
/// Holds only immutable configuration, so a single instance can serve
/// concurrent callers. Each [`analyze`](Self::analyze) call is independent.
#[derive(Clone)]
pub struct SignalAggregator {
    config: SignalConfig,
    backend: Arc<dyn IndicatorBackend>,
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self {
            config: SignalConfig::default(),
            backend: Arc::new(StreamingBackend),
        }
    }
}

impl std::fmt::Debug for SignalAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalAggregator")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl SignalAggregator {
    pub fn new(config: SignalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            backend: Arc::new(StreamingBackend),
        })
    }

    pub fn with_backend(mut self, backend: Arc<dyn IndicatorBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Computes the indicator frame and the recommendation for the last bar.
    ///
    /// Series shorter than `min_bars` are rejected with
    /// [`SignalError::InsufficientData`]; nothing is computed for them.
    pub fn analyze(&self, series: &Series) -> Result<Analysis, SignalError> {
        let symbol = series.symbol();
        let n = series.len();
        if n < self.config.min_bars {
            warn!(
                "SignalAggregator [{}]: Insufficient data for indicator calculation ({} < {})",
                symbol, n, self.config.min_bars
            );
            return Err(SignalError::InsufficientData {
                required: self.config.min_bars,
                actual: n,
            });
        }

        let frame = self.build_frame(series)?;
        let snapshot = self.snapshot(&frame)?;

        info!(
            "SignalAggregator [{}]: Analysis completed: {} (close={:.4}, atr={:.4}, macd={})",
            symbol, snapshot.recommendation, snapshot.last_close, snapshot.atr, snapshot.macd_params
        );
        Ok(Analysis { frame, snapshot })
    }

    fn build_frame(&self, series: &Series) -> Result<IndicatorFrame, SignalError> {
        let backend = self.backend.as_ref();
        let cols = series.columns();

        let core = compute_core_indicators(backend, &cols, &self.config)?;
        let calibration = optimize_macd_params(backend, &cols.close, &self.config.macd_search);
        let macd = compute_wavelet_macd(
            backend,
            &cols.close,
            calibration.params,
            self.config.wavelet_levels,
        )?;
        let grid = compute_grid(&cols.high, &cols.low, &core.atr, self.config.grid_window)?;
        debug!(
            "SignalAggregator [{}]: grid window {} bars, MACD {} (fitness {:?})",
            series.symbol(),
            grid.window,
            calibration.params,
            calibration.fitness
        );

        let mut frame = IndicatorFrame {
            symbol: series.symbol().to_string(),
            macd_params: calibration.params,
            timestamp: cols.timestamp,
            open: cols.open,
            high: cols.high,
            low: cols.low,
            close: cols.close,
            volume: cols.volume,
            ema_fast: core.ema_fast,
            ema_slow: core.ema_slow,
            rsi: core.rsi,
            adx: core.adx,
            atr: core.atr,
            volume_sma: core.volume_sma,
            dif: macd.dif,
            dea: macd.dea,
            macd: macd.macd,
            grid_center: grid.center,
            grid_low: grid.low,
            grid_up: grid.up,
            recommendations: Vec::new(),
        };
        frame.recommendations = (0..frame.len())
            .map(|i| evaluate_bar(&frame, &self.config, i).recommendation())
            .collect();
        Ok(frame)
    }

    fn snapshot(&self, frame: &IndicatorFrame) -> Result<SignalSnapshot, SignalError> {
        let last = frame.len() - 1;
        ensure_defined(frame, last)?;

        let flags = evaluate_bar(frame, &self.config, last);
        let close = frame.close[last];
        let atr = frame.atr[last];

        Ok(SignalSnapshot {
            symbol: frame.symbol.clone(),
            timestamp: frame.timestamp[last],
            last_close: close,
            atr,
            macd_params: frame.macd_params,
            flags,
            recommendation: flags.recommendation(),
            risk: RiskLevels::from_atr(
                close,
                atr,
                self.config.stop_loss_atr_multiplier,
                self.config.take_profit_atr_multiplier,
            ),
        })
    }
}

/// Every column the last-bar evaluation reads must be defined there, and the
/// ones compared against the previous bar must be defined one bar earlier.
fn ensure_defined(frame: &IndicatorFrame, last: usize) -> Result<(), SignalError> {
    for (column, values) in frame.derived_columns() {
        if !values[last].is_finite() {
            return Err(SignalError::UndefinedValue { column });
        }
    }
    let previous = [
        ("rsi", &frame.rsi),
        ("dif", &frame.dif),
        ("dea", &frame.dea),
    ];
    for (column, values) in previous {
        if last == 0 || !values[last - 1].is_finite() {
            return Err(SignalError::UndefinedValue { column });
        }
    }
    Ok(())
}

/// Evaluates every confluence condition on bar `i` of a frame.
///
/// Conditions that need a previous bar are false on the first bar; any
/// comparison against an undefined (NaN) value is false.
pub fn evaluate_bar(frame: &IndicatorFrame, config: &SignalConfig, i: usize) -> SignalFlags {
    let prev = |values: &Vec<f64>| if i > 0 { values[i - 1] } else { f64::NAN };

    let (open, high, low, close) = (frame.open[i], frame.high[i], frame.low[i], frame.close[i]);
    let (prev_open, prev_close) = (prev(&frame.open), prev(&frame.close));
    let (ema_fast, ema_slow) = (frame.ema_fast[i], frame.ema_slow[i]);
    let rsi = frame.rsi[i];
    let rsi_change = rsi - prev(&frame.rsi);
    let atr = frame.atr[i];
    let (dif, dea) = (frame.dif[i], frame.dea[i]);
    let (macd_buy, macd_sell) = macd_cross(prev(&frame.dif), prev(&frame.dea), dif, dea);
    let (grid_buy, grid_sell) = grid_signal(close, frame.grid_low[i], frame.grid_up[i]);

    SignalFlags {
        trend_up: ema_fast > ema_slow,
        trend_down: ema_fast < ema_slow,
        momentum_buy: rsi < config.rsi_buy_threshold && rsi_change > 0.0,
        momentum_sell: rsi > config.rsi_sell_threshold && rsi_change < 0.0,
        trend_strong: frame.adx[i] > config.adx_threshold,
        valid_volatility: (high - low) > config.volatility_atr_ratio * atr,
        volume_spike: frame.volume[i] > config.volume_spike_ratio * frame.volume_sma[i],
        bull_candle: close > open && (close - open) > (prev_close - prev_open),
        bear_candle: close < open && (open - close) > (prev_open - prev_close),
        macd_buy,
        macd_sell,
        grid_buy,
        grid_sell,
    }
}

/// Count of BUY / SELL / WAIT over a frame's per-bar recommendations
pub fn recommendation_counts(frame: &IndicatorFrame) -> (usize, usize, usize) {
    frame
        .recommendations
        .iter()
        .fold((0, 0, 0), |(b, s, w), r| match r {
            Recommendation::Buy => (b + 1, s, w),
            Recommendation::Sell => (b, s + 1, w),
            Recommendation::Wait => (b, s, w + 1),
        })
}
