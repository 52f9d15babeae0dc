use thiserror::Error;

/// Errors produced while turning a bar series into an analysis.
///
/// Recoverable numerical problems (wavelet reconstruction, MACD calibration)
/// never surface here; they fall back locally and are only logged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    #[error("Insufficient data: need at least {required} bars, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid series: {reason}")]
    InvalidSeries { reason: String },

    #[error("Indicator {name} could not be built: {reason}")]
    Indicator { name: &'static str, reason: String },

    #[error("Column {column} is undefined on the last bar")]
    UndefinedValue { column: &'static str },
}

impl SignalError {
    pub fn indicator(name: &'static str, err: ta::errors::TaError) -> Self {
        SignalError::Indicator {
            name,
            reason: format!("{:?}", err),
        }
    }
}

/// Failures of the wavelet transform; callers fall back to the raw signal
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaveletError {
    #[error("Non-finite sample at index {index}")]
    NonFinite { index: usize },

    #[error("Band too short for reconstruction: {len} < {min}")]
    TooShort { len: usize, min: usize },

    #[error("Approximation band ({approx}) does not match detail band ({detail})")]
    BandMismatch { approx: usize, detail: usize },
}

/// Errors raised when a [`SignalConfig`](crate::domain::signals::SignalConfig) is inconsistent
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Period {name} must be > 0")]
    ZeroPeriod { name: &'static str },

    #[error("EMA fast period ({fast}) must be shorter than slow period ({slow})")]
    EmaOrdering { fast: usize, slow: usize },

    #[error("Threshold {name} must be finite and positive, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Minimum bar count {min_bars} is below the warm-up of {warmup} bars")]
    MinBarsTooSmall { min_bars: usize, warmup: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_formatting() {
        let err = SignalError::InsufficientData {
            required: 100,
            actual: 50,
        };

        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn test_indicator_error_wraps_ta_error() {
        let err = SignalError::indicator("EMA", ta::errors::TaError::InvalidParameter);
        assert!(err.to_string().contains("EMA"));
        assert!(err.to_string().contains("InvalidParameter"));
    }

    #[test]
    fn test_config_error_formatting() {
        let err = ConfigError::EmaOrdering { fast: 21, slow: 9 };
        let msg = err.to_string();
        assert!(msg.contains("21"));
        assert!(msg.contains("9"));
    }
}
