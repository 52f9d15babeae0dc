//! Signal engine configuration parsing from environment variables.
//!
//! Every variable is optional; unset variables keep the reference defaults.

use crate::domain::signals::SignalConfig;
use anyhow::{Context, Result};
use std::env;

/// Signal environment configuration
#[derive(Debug, Clone)]
pub struct SignalEnvConfig {
    pub signal: SignalConfig,
}

impl SignalEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = SignalConfig::default();

        let mut signal = SignalConfig {
            // Trend
            ema_fast_period: Self::parse_usize("EMA_FAST_PERIOD", defaults.ema_fast_period)?,
            ema_slow_period: Self::parse_usize("EMA_SLOW_PERIOD", defaults.ema_slow_period)?,

            // Momentum
            rsi_period: Self::parse_usize("RSI_PERIOD", defaults.rsi_period)?,
            rsi_buy_threshold: Self::parse_f64("RSI_BUY_THRESHOLD", defaults.rsi_buy_threshold)?,
            rsi_sell_threshold: Self::parse_f64(
                "RSI_SELL_THRESHOLD",
                defaults.rsi_sell_threshold,
            )?,

            // Strength / volatility / volume
            adx_period: Self::parse_usize("ADX_PERIOD", defaults.adx_period)?,
            adx_threshold: Self::parse_f64("ADX_THRESHOLD", defaults.adx_threshold)?,
            atr_period: Self::parse_usize("ATR_PERIOD", defaults.atr_period)?,
            volatility_atr_ratio: Self::parse_f64(
                "VOLATILITY_ATR_RATIO",
                defaults.volatility_atr_ratio,
            )?,
            volume_sma_period: Self::parse_usize("VOLUME_SMA_PERIOD", defaults.volume_sma_period)?,
            volume_spike_ratio: Self::parse_f64(
                "VOLUME_SPIKE_RATIO",
                defaults.volume_spike_ratio,
            )?,

            // Grid and wavelet
            grid_window: Self::parse_usize("GRID_WINDOW", defaults.grid_window)?,
            wavelet_levels: Self::parse_usize("WAVELET_LEVELS", defaults.wavelet_levels)?,

            // Risk bracket
            stop_loss_atr_multiplier: Self::parse_f64(
                "STOP_LOSS_ATR_MULTIPLIER",
                defaults.stop_loss_atr_multiplier,
            )?,
            take_profit_atr_multiplier: Self::parse_f64(
                "TAKE_PROFIT_ATR_MULTIPLIER",
                defaults.take_profit_atr_multiplier,
            )?,

            min_bars: Self::parse_usize("MIN_BARS", defaults.min_bars)?,
            macd_search: defaults.macd_search,
        };
        signal.macd_search.min_points = signal.min_bars;

        signal
            .validate()
            .context("Invalid signal configuration from environment")?;

        Ok(Self { signal })
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
