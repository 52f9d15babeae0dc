use crate::domain::errors::SignalError;

/// Indicator primitives the signal engine is built on.
///
/// Every method returns a vector of the same length as its input, left-padded
/// with `f64::NAN` where the indicator has not accumulated enough history.
/// Implementations must be pure: no state is carried between calls.
/// A zero period is rejected with [`SignalError::Indicator`].
pub trait IndicatorBackend: Send + Sync {
    /// Exponential moving average, alpha = 2 / (span + 1), seeded with the
    /// first defined input. Leading NaN inputs are skipped and the first
    /// `span - 1` outputs after the seed stay undefined.
    fn ema(&self, values: &[f64], span: usize) -> Result<Vec<f64>, SignalError>;

    /// Simple moving average over a full window.
    fn sma(&self, values: &[f64], period: usize) -> Result<Vec<f64>, SignalError>;

    /// Relative strength index from close-to-close differences, gains and
    /// losses averaged with a rolling mean. Output lies in [0, 100].
    fn rsi(&self, close: &[f64], period: usize) -> Result<Vec<f64>, SignalError>;

    /// Average true range with Wilder smoothing.
    fn atr(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        period: usize,
    ) -> Result<Vec<f64>, SignalError>;

    /// Average directional index with Wilder smoothing.
    fn adx(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        period: usize,
    ) -> Result<Vec<f64>, SignalError>;

    fn name(&self) -> &'static str;
}
