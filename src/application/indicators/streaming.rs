use crate::domain::errors::SignalError;
use crate::domain::ports::IndicatorBackend;
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage, TrueRange};

/// High/low/close triple fed to `ta` indicators that need a bar
struct Hlc {
    high: f64,
    low: f64,
    close: f64,
}

impl ta::High for Hlc {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Hlc {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Hlc {
    fn close(&self) -> f64 {
        self.close
    }
}

fn ensure_period(name: &'static str, period: usize) -> Result<(), SignalError> {
    if period == 0 {
        return Err(SignalError::indicator(
            name,
            ta::errors::TaError::InvalidParameter,
        ));
    }
    Ok(())
}

/// Wilder-smoothed average true range.
///
/// Seeded with the plain mean of the first `period` true ranges, then
/// `atr = (atr * (n - 1) + tr) / n`.
pub struct WilderAtr {
    period: usize,
    true_range: TrueRange,
    tr_sum: f64,
    atr: f64,
    count: usize,
}

impl WilderAtr {
    pub fn new(period: usize) -> Result<Self, SignalError> {
        ensure_period("ATR", period)?;
        Ok(Self {
            period,
            true_range: TrueRange::new(),
            tr_sum: 0.0,
            atr: 0.0,
            count: 0,
        })
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let tr = self.true_range.next(&Hlc { high, low, close });
        self.count += 1;

        if self.count < self.period {
            self.tr_sum += tr;
            return None;
        }
        if self.count == self.period {
            self.tr_sum += tr;
            self.atr = self.tr_sum / self.period as f64;
        } else {
            let n = self.period as f64;
            self.atr = (self.atr * (n - 1.0) + tr) / n;
        }
        Some(self.atr)
    }
}

/// Average Directional Index using Wilder's smoothing
///
/// TR, +DM and -DM accumulate as plain sums over the first `period` moves, then
/// decay as `s = s - s/n + x`. ADX is seeded with the mean of the first
/// `period` DX values.
pub struct WilderAdx {
    period: usize,
    prev: Option<(f64, f64, f64)>,
    tr_smooth: f64,
    plus_dm_smooth: f64,
    minus_dm_smooth: f64,
    dx_sum: f64,
    adx: f64,
    count: usize,
}

impl WilderAdx {
    pub fn new(period: usize) -> Result<Self, SignalError> {
        ensure_period("ADX", period)?;
        Ok(Self {
            period,
            prev: None,
            tr_smooth: 0.0,
            plus_dm_smooth: 0.0,
            minus_dm_smooth: 0.0,
            dx_sum: 0.0,
            adx: 0.0,
            count: 0,
        })
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let Some((prev_high, prev_low, prev_close)) = self.prev.replace((high, low, close)) else {
            return None;
        };

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        let up_move = high - prev_high;
        let down_move = prev_low - low;
        let plus_dm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus_dm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        self.count += 1;
        let n = self.period as f64;

        if self.count <= self.period {
            self.tr_smooth += tr;
            self.plus_dm_smooth += plus_dm;
            self.minus_dm_smooth += minus_dm;
            if self.count < self.period {
                return None;
            }
        } else {
            self.tr_smooth = self.tr_smooth - (self.tr_smooth / n) + tr;
            self.plus_dm_smooth = self.plus_dm_smooth - (self.plus_dm_smooth / n) + plus_dm;
            self.minus_dm_smooth = self.minus_dm_smooth - (self.minus_dm_smooth / n) + minus_dm;
        }

        let dx = directional_index(self.tr_smooth, self.plus_dm_smooth, self.minus_dm_smooth);
        let dx_count = self.count - self.period + 1;

        if dx_count < self.period {
            self.dx_sum += dx;
            return None;
        }
        if dx_count == self.period {
            self.adx = (self.dx_sum + dx) / n;
        } else {
            self.adx = (self.adx * (n - 1.0) + dx) / n;
        }
        Some(self.adx)
    }
}

pub(crate) fn directional_index(tr_smooth: f64, plus_dm_smooth: f64, minus_dm_smooth: f64) -> f64 {
    if tr_smooth <= 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * plus_dm_smooth / tr_smooth;
    let minus_di = 100.0 * minus_dm_smooth / tr_smooth;
    let sum_di = plus_di + minus_di;
    if sum_di > 0.0 {
        100.0 * (plus_di - minus_di).abs() / sum_di
    } else {
        0.0
    }
}

pub(crate) fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain.max(0.0) / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Backend that replays each column through the streaming indicators of the
/// `ta` crate, one sample at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingBackend;

impl IndicatorBackend for StreamingBackend {
    fn ema(&self, values: &[f64], span: usize) -> Result<Vec<f64>, SignalError> {
        let mut ema =
            ExponentialMovingAverage::new(span).map_err(|e| SignalError::indicator("EMA", e))?;
        let mut out = vec![f64::NAN; values.len()];
        let mut seen = 0usize;

        for (slot, &value) in out.iter_mut().zip(values) {
            if !value.is_finite() {
                continue;
            }
            let current = ema.next(value);
            seen += 1;
            if seen >= span {
                *slot = current;
            }
        }
        Ok(out)
    }

    fn sma(&self, values: &[f64], period: usize) -> Result<Vec<f64>, SignalError> {
        let mut sma =
            SimpleMovingAverage::new(period).map_err(|e| SignalError::indicator("SMA", e))?;
        Ok(values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let avg = sma.next(v);
                if i + 1 >= period { avg } else { f64::NAN }
            })
            .collect())
    }

    fn rsi(&self, close: &[f64], period: usize) -> Result<Vec<f64>, SignalError> {
        let mut gains =
            SimpleMovingAverage::new(period).map_err(|e| SignalError::indicator("RSI", e))?;
        let mut losses =
            SimpleMovingAverage::new(period).map_err(|e| SignalError::indicator("RSI", e))?;
        let mut out = vec![f64::NAN; close.len()];

        for i in 1..close.len() {
            let change = close[i] - close[i - 1];
            let avg_gain = gains.next(change.max(0.0));
            let avg_loss = losses.next((-change).max(0.0));
            if i >= period {
                out[i] = rsi_from_averages(avg_gain, avg_loss);
            }
        }
        Ok(out)
    }

    fn atr(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        period: usize,
    ) -> Result<Vec<f64>, SignalError> {
        let mut atr = WilderAtr::new(period)?;
        Ok(high
            .iter()
            .zip(low)
            .zip(close)
            .map(|((&h, &l), &c)| atr.next(h, l, c).unwrap_or(f64::NAN))
            .collect())
    }

    fn adx(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        period: usize,
    ) -> Result<Vec<f64>, SignalError> {
        let mut adx = WilderAdx::new(period)?;
        Ok(high
            .iter()
            .zip(low)
            .zip(close)
            .map(|((&h, &l), &c)| adx.next(h, l, c).unwrap_or(f64::NAN))
            .collect())
    }

    fn name(&self) -> &'static str {
        "streaming"
    }
}
