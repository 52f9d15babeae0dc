use crate::domain::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// (fast, slow, signal) periods of a MACD oscillator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacdParams {
    #[serde(rename = "macd_fast")]
    pub fast: usize,
    #[serde(rename = "macd_slow")]
    pub slow: usize,
    #[serde(rename = "macd_signal")]
    pub signal: usize,
}

impl MacdParams {
    pub const fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self { fast, slow, signal }
    }
}

impl Default for MacdParams {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl std::fmt::Display for MacdParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.fast, self.slow, self.signal)
    }
}

/// Candidate periods explored by the MACD calibration.
///
/// Candidates are enumerated fast -> slow -> signal, skipping `slow <= fast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSearchSpace {
    pub fast: Vec<usize>,
    pub slow: Vec<usize>,
    pub signal: Vec<usize>,
    pub fallback: MacdParams,
    /// Below this many closes the search is skipped and `fallback` is used
    pub min_points: usize,
}

impl Default for MacdSearchSpace {
    fn default() -> Self {
        Self {
            fast: vec![8, 9, 10, 11, 12],
            slow: vec![22, 24, 26, 28],
            signal: vec![7, 8, 9, 10],
            fallback: MacdParams::default(),
            min_points: 100,
        }
    }
}

impl MacdSearchSpace {
    pub fn candidates(&self) -> impl Iterator<Item = MacdParams> + '_ {
        self.fast.iter().flat_map(move |&fast| {
            self.slow
                .iter()
                .filter(move |&&slow| slow > fast)
                .flat_map(move |&slow| {
                    self.signal
                        .iter()
                        .map(move |&signal| MacdParams::new(fast, slow, signal))
                })
        })
    }

    /// Longest warm-up any candidate needs before its MACD line is defined.
    pub fn max_warmup(&self) -> usize {
        let slow = self.slow.iter().chain([&self.fallback.slow]).max();
        let signal = self.signal.iter().chain([&self.fallback.signal]).max();
        slow.copied().unwrap_or(0) + signal.copied().unwrap_or(0)
    }
}

/// Tuning parameters of the signal engine.
///
/// `Default` reproduces the reference rule set: EMA 9/21, RSI 7, ADX/ATR 14,
/// volume SMA 20, a 60-bar grid window and a 1:3 risk/reward bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    // Trend
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,

    // Momentum
    pub rsi_period: usize,
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,

    // Trend strength
    pub adx_period: usize,
    pub adx_threshold: f64,

    // Volatility
    pub atr_period: usize,
    pub volatility_atr_ratio: f64,

    // Volume
    pub volume_sma_period: usize,
    pub volume_spike_ratio: f64,

    // Dynamic grid
    pub grid_window: usize,

    // Wavelet MACD
    pub macd_search: MacdSearchSpace,
    pub wavelet_levels: usize,

    // Risk bracket
    pub stop_loss_atr_multiplier: f64,
    pub take_profit_atr_multiplier: f64,

    pub min_bars: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            ema_fast_period: 9,
            ema_slow_period: 21,
            rsi_period: 7,
            rsi_buy_threshold: 40.0,
            rsi_sell_threshold: 60.0,
            adx_period: 14,
            adx_threshold: 20.0,
            atr_period: 14,
            volatility_atr_ratio: 0.8,
            volume_sma_period: 20,
            volume_spike_ratio: 1.5,
            grid_window: 60,
            macd_search: MacdSearchSpace::default(),
            wavelet_levels: 3,
            stop_loss_atr_multiplier: 0.5,
            take_profit_atr_multiplier: 1.5,
            min_bars: 100,
        }
    }
}

impl SignalConfig {
    /// Bars needed before every column read on the last bar is defined.
    pub fn warmup_bars(&self) -> usize {
        [
            self.ema_slow_period,
            self.rsi_period + 2,
            2 * self.adx_period,
            self.atr_period + 1,
            self.volume_sma_period,
            self.grid_window,
            self.macd_search.max_warmup(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("ema_fast_period", self.ema_fast_period),
            ("ema_slow_period", self.ema_slow_period),
            ("rsi_period", self.rsi_period),
            ("adx_period", self.adx_period),
            ("atr_period", self.atr_period),
            ("volume_sma_period", self.volume_sma_period),
            ("grid_window", self.grid_window),
            ("wavelet_levels", self.wavelet_levels),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod { name });
            }
        }
        let search = &self.macd_search;
        if search
            .fast
            .iter()
            .chain(&search.slow)
            .chain(&search.signal)
            .chain([&search.fallback.fast, &search.fallback.signal])
            .any(|&p| p == 0)
        {
            return Err(ConfigError::ZeroPeriod { name: "macd_search" });
        }

        if self.ema_fast_period >= self.ema_slow_period {
            return Err(ConfigError::EmaOrdering {
                fast: self.ema_fast_period,
                slow: self.ema_slow_period,
            });
        }
        if search.fallback.fast >= search.fallback.slow {
            return Err(ConfigError::EmaOrdering {
                fast: search.fallback.fast,
                slow: search.fallback.slow,
            });
        }

        let thresholds = [
            ("rsi_buy_threshold", self.rsi_buy_threshold),
            ("rsi_sell_threshold", self.rsi_sell_threshold),
            ("adx_threshold", self.adx_threshold),
            ("volatility_atr_ratio", self.volatility_atr_ratio),
            ("volume_spike_ratio", self.volume_spike_ratio),
            ("stop_loss_atr_multiplier", self.stop_loss_atr_multiplier),
            ("take_profit_atr_multiplier", self.take_profit_atr_multiplier),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        let warmup = self.warmup_bars();
        if self.min_bars < warmup {
            return Err(ConfigError::MinBarsTooSmall {
                min_bars: self.min_bars,
                warmup,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_search_space_has_80_candidates() {
        let space = MacdSearchSpace::default();
        assert_eq!(space.candidates().count(), 80);
    }

    #[test]
    fn test_candidates_enumeration_order() {
        let space = MacdSearchSpace::default();
        let first: Vec<MacdParams> = space.candidates().take(5).collect();
        assert_eq!(first[0], MacdParams::new(8, 22, 7));
        assert_eq!(first[3], MacdParams::new(8, 22, 10));
        assert_eq!(first[4], MacdParams::new(8, 24, 7));
        assert_eq!(space.candidates().last(), Some(MacdParams::new(12, 28, 10)));
    }

    #[test]
    fn test_candidates_skip_slow_not_above_fast() {
        let space = MacdSearchSpace {
            fast: vec![10, 24],
            slow: vec![22, 24, 26],
            signal: vec![9],
            ..Default::default()
        };
        let all: Vec<MacdParams> = space.candidates().collect();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|p| p.slow > p.fast));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SignalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warmup_bars(), 60);
    }

    #[test]
    fn test_validate_rejects_inverted_emas() {
        let config = SignalConfig {
            ema_fast_period: 21,
            ema_slow_period: 9,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmaOrdering { fast: 21, slow: 9 })
        );
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let config = SignalConfig {
            atr_period: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroPeriod { name: "atr_period" })
        );
    }

    #[test]
    fn test_validate_rejects_zero_wavelet_levels() {
        let config = SignalConfig {
            wavelet_levels: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroPeriod {
                name: "wavelet_levels"
            })
        );
    }

    #[test]
    fn test_validate_rejects_short_min_bars() {
        let config = SignalConfig {
            min_bars: 30,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MinBarsTooSmall { warmup: 60, .. })
        ));
    }

    #[test]
    fn test_macd_params_serialize_with_prefix() {
        let json = serde_json::to_value(MacdParams::default()).unwrap();
        assert_eq!(json["macd_fast"], 12);
        assert_eq!(json["macd_slow"], 26);
        assert_eq!(json["macd_signal"], 9);
    }
}
