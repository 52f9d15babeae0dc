use super::streaming::{directional_index, rsi_from_averages};
use crate::domain::errors::SignalError;
use crate::domain::ports::IndicatorBackend;

fn ensure_period(name: &'static str, period: usize) -> Result<(), SignalError> {
    if period == 0 {
        return Err(SignalError::indicator(
            name,
            ta::errors::TaError::InvalidParameter,
        ));
    }
    Ok(())
}

fn true_ranges(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (0..high.len())
        .map(|i| {
            let range = high[i] - low[i];
            if i == 0 {
                range
            } else {
                range
                    .max((high[i] - close[i - 1]).abs())
                    .max((low[i] - close[i - 1]).abs())
            }
        })
        .collect()
}

/// Whole-array implementation of the indicator primitives.
///
/// Computes each indicator in one pass over the full column, with windowed
/// sums taken directly instead of incrementally.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorBackend;

impl IndicatorBackend for VectorBackend {
    fn ema(&self, values: &[f64], span: usize) -> Result<Vec<f64>, SignalError> {
        ensure_period("EMA", span)?;
        let alpha = 2.0 / (span as f64 + 1.0);
        let mut out = vec![f64::NAN; values.len()];
        let mut current: Option<f64> = None;
        let mut seen = 0usize;

        for (i, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                continue;
            }
            let next = match current {
                Some(prev) => alpha * value + (1.0 - alpha) * prev,
                None => value,
            };
            current = Some(next);
            seen += 1;
            if seen >= span {
                out[i] = next;
            }
        }
        Ok(out)
    }

    fn sma(&self, values: &[f64], period: usize) -> Result<Vec<f64>, SignalError> {
        ensure_period("SMA", period)?;
        let mut out = vec![f64::NAN; values.len()];
        for (i, window) in values.windows(period).enumerate() {
            out[i + period - 1] = window.iter().sum::<f64>() / period as f64;
        }
        Ok(out)
    }

    fn rsi(&self, close: &[f64], period: usize) -> Result<Vec<f64>, SignalError> {
        ensure_period("RSI", period)?;
        let mut out = vec![f64::NAN; close.len()];
        if close.len() <= period {
            return Ok(out);
        }

        let changes: Vec<f64> = close.windows(2).map(|w| w[1] - w[0]).collect();
        for (i, window) in changes.windows(period).enumerate() {
            let avg_gain = window.iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
            let avg_loss = window.iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;
            // changes[k] belongs to bar k + 1
            out[i + period] = rsi_from_averages(avg_gain, avg_loss);
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
        ensure_period("ATR", period)?;
        let mut out = vec![f64::NAN; high.len()];
        if high.len() < period {
            return Ok(out);
        }

        let tr = true_ranges(high, low, close);
        let n = period as f64;
        let mut atr = tr[..period].iter().sum::<f64>() / n;
        out[period - 1] = atr;
        for i in period..tr.len() {
            atr = (atr * (n - 1.0) + tr[i]) / n;
            out[i] = atr;
        }
        Ok(out)
    }

    fn adx(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        period: usize,
    ) -> Result<Vec<f64>, SignalError> {
        ensure_period("ADX", period)?;
        let len = high.len();
        let mut out = vec![f64::NAN; len];
        if len < 2 * period {
            return Ok(out);
        }

        let tr = true_ranges(high, low, close);
        let mut plus_dm = vec![0.0; len];
        let mut minus_dm = vec![0.0; len];
        for i in 1..len {
            let up_move = high[i] - high[i - 1];
            let down_move = low[i - 1] - low[i];
            if up_move > down_move && up_move > 0.0 {
                plus_dm[i] = up_move;
            }
            if down_move > up_move && down_move > 0.0 {
                minus_dm[i] = down_move;
            }
        }

        let n = period as f64;
        let mut tr_s: f64 = tr[1..=period].iter().sum();
        let mut plus_s: f64 = plus_dm[1..=period].iter().sum();
        let mut minus_s: f64 = minus_dm[1..=period].iter().sum();

        let mut dx = vec![f64::NAN; len];
        dx[period] = directional_index(tr_s, plus_s, minus_s);
        for i in (period + 1)..len {
            tr_s = tr_s - tr_s / n + tr[i];
            plus_s = plus_s - plus_s / n + plus_dm[i];
            minus_s = minus_s - minus_s / n + minus_dm[i];
            dx[i] = directional_index(tr_s, plus_s, minus_s);
        }

        let seed = 2 * period - 1;
        let mut adx = dx[period..=seed].iter().sum::<f64>() / n;
        out[seed] = adx;
        for i in (seed + 1)..len {
            adx = (adx * (n - 1.0) + dx[i]) / n;
            out[i] = adx;
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "vector"
    }
}
