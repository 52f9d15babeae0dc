use crate::domain::signals::config::MacdParams;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    #[default]
    Wait,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Buy => write!(f, "BUY"),
            Recommendation::Sell => write!(f, "SELL"),
            Recommendation::Wait => write!(f, "WAIT"),
        }
    }
}

/// Boolean conditions evaluated on a single bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalFlags {
    pub trend_up: bool,
    pub trend_down: bool,
    pub momentum_buy: bool,
    pub momentum_sell: bool,
    pub trend_strong: bool,
    pub valid_volatility: bool,
    pub volume_spike: bool,
    pub bull_candle: bool,
    pub bear_candle: bool,
    pub macd_buy: bool,
    pub macd_sell: bool,
    pub grid_buy: bool,
    pub grid_sell: bool,
}

impl SignalFlags {
    pub fn buy_confluence(&self) -> bool {
        self.trend_up
            && self.momentum_buy
            && self.trend_strong
            && self.valid_volatility
            && self.volume_spike
            && self.bull_candle
            && (self.macd_buy || self.grid_buy)
    }

    pub fn sell_confluence(&self) -> bool {
        self.trend_down
            && self.momentum_sell
            && self.trend_strong
            && self.valid_volatility
            && self.volume_spike
            && self.bear_candle
            && (self.macd_sell || self.grid_sell)
    }

    /// BUY is checked first and wins if both sides hold.
    pub fn recommendation(&self) -> Recommendation {
        if self.buy_confluence() {
            Recommendation::Buy
        } else if self.sell_confluence() {
            Recommendation::Sell
        } else {
            Recommendation::Wait
        }
    }
}

/// Stop-loss / take-profit levels for both sides, derived from close and ATR
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss_buy: f64,
    pub take_profit_buy: f64,
    pub stop_loss_sell: f64,
    pub take_profit_sell: f64,
}

impl RiskLevels {
    pub fn from_atr(close: f64, atr: f64, stop_multiplier: f64, target_multiplier: f64) -> Self {
        Self {
            stop_loss_buy: close - stop_multiplier * atr,
            take_profit_buy: close + target_multiplier * atr,
            stop_loss_sell: close + stop_multiplier * atr,
            take_profit_sell: close - target_multiplier * atr,
        }
    }
}

/// Recommendation for the latest bar of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub symbol: String,
    pub timestamp: i64,
    pub last_close: f64,
    pub atr: f64,
    #[serde(flatten)]
    pub macd_params: MacdParams,
    #[serde(flatten)]
    pub flags: SignalFlags,
    pub recommendation: Recommendation,
    #[serde(flatten)]
    pub risk: RiskLevels,
}

/// A series enriched with indicator columns.
///
/// Every column has the length of the input series and is aligned with it
/// by position; NaN marks indices without enough history and is written as
/// `null` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub symbol: String,
    pub macd_params: MacdParams,

    pub timestamp: Vec<i64>,
    #[serde(with = "nullable_floats")]
    pub open: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub high: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub low: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub close: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub volume: Vec<f64>,

    #[serde(with = "nullable_floats")]
    pub ema_fast: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub ema_slow: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub rsi: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub adx: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub atr: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub volume_sma: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub dif: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub dea: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub macd: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub grid_center: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub grid_low: Vec<f64>,
    #[serde(with = "nullable_floats")]
    pub grid_up: Vec<f64>,

    pub recommendations: Vec<Recommendation>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Named derived columns, in display order.
    pub fn derived_columns(&self) -> [(&'static str, &[f64]); 12] {
        [
            ("ema_fast", self.ema_fast.as_slice()),
            ("ema_slow", self.ema_slow.as_slice()),
            ("rsi", self.rsi.as_slice()),
            ("adx", self.adx.as_slice()),
            ("atr", self.atr.as_slice()),
            ("volume_sma", self.volume_sma.as_slice()),
            ("dif", self.dif.as_slice()),
            ("dea", self.dea.as_slice()),
            ("macd", self.macd.as_slice()),
            ("grid_center", self.grid_center.as_slice()),
            ("grid_low", self.grid_low.as_slice()),
            ("grid_up", self.grid_up.as_slice()),
        ]
    }
}

/// Float columns with undefined entries: NaN <-> `null`
mod nullable_floats {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.is_finite().then_some(*value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}

/// Result of analysing one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub frame: IndicatorFrame,
    pub snapshot: SignalSnapshot,
}
