//! Wavelet-denoised MACD with data-driven period selection.

pub mod optimizer;
pub mod wavelet;

pub use optimizer::{MacdCalibration, macd_fitness, optimize_macd_params};
pub use wavelet::{Wavelet, wavelet_denoise};

use crate::domain::errors::SignalError;
use crate::domain::ports::IndicatorBackend;
use crate::domain::signals::MacdParams;

/// DIF / DEA / MACD columns, aligned with the close series
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletMacd {
    pub params: MacdParams,
    /// Denoised EMA spread
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub macd: Vec<f64>,
}

/// `(bullish, bearish)` crossing of DIF over DEA from the previous bar into
/// the current one. Any undefined input yields no cross.
pub fn macd_cross(prev_dif: f64, prev_dea: f64, dif: f64, dea: f64) -> (bool, bool) {
    (
        prev_dif < prev_dea && dif > dea,
        prev_dif > prev_dea && dif < dea,
    )
}

/// Computes the MACD oscillator on a wavelet-denoised DIF.
///
/// The undefined warm-up prefix of the raw DIF is kept out of the transform
/// and re-attached as NaN afterwards.
pub fn compute_wavelet_macd(
    backend: &dyn IndicatorBackend,
    close: &[f64],
    params: MacdParams,
    wavelet_levels: usize,
) -> Result<WaveletMacd, SignalError> {
    let fast = backend.ema(close, params.fast)?;
    let slow = backend.ema(close, params.slow)?;
    let raw: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

    let start = raw
        .iter()
        .position(|d| d.is_finite())
        .unwrap_or(raw.len());
    let mut dif = vec![f64::NAN; start];
    dif.extend(wavelet_denoise(&raw[start..], wavelet_levels));

    let dea = backend.ema(&dif, params.signal)?;
    let macd = dif.iter().zip(&dea).map(|(d, e)| d - e).collect();

    Ok(WaveletMacd {
        params,
        dif,
        dea,
        macd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::indicators::StreamingBackend;

    #[test]
    fn test_columns_align_with_input() {
        let close: Vec<f64> = (0..120).map(|i| 50.0 + (i as f64 / 5.0).sin()).collect();
        let macd = compute_wavelet_macd(&StreamingBackend, &close, MacdParams::default(), 3).unwrap();

        assert_eq!(macd.dif.len(), 120);
        assert_eq!(macd.dea.len(), 120);
        assert_eq!(macd.macd.len(), 120);
        // slow EMA warm-up, then signal warm-up
        assert!(macd.dif[24].is_nan());
        assert!(macd.dif[25].is_finite());
        assert!(macd.dea[32].is_nan());
        assert!(macd.dea[33].is_finite());
        assert!(macd.macd[119].is_finite());
    }

    #[test]
    fn test_cross_detection() {
        assert_eq!(macd_cross(-1.0, 0.0, 1.0, 0.0), (true, false));
        assert_eq!(macd_cross(1.0, 0.0, -0.5, 0.0), (false, true));
        // touching the signal line is not a cross
        assert_eq!(macd_cross(1.0, 0.0, 0.5, 0.5), (false, false));
        assert_eq!(macd_cross(0.5, 0.5, -0.5, 0.0), (false, false));
        assert_eq!(macd_cross(f64::NAN, f64::NAN, 1.0, 0.0), (false, false));
    }

    #[test]
    fn test_flat_prices_give_flat_oscillator() {
        let close = vec![10.0; 150];
        let macd = compute_wavelet_macd(&StreamingBackend, &close, MacdParams::default(), 3).unwrap();
        assert!(macd.dif[25..].iter().all(|d| d.abs() < 1e-9));
        assert!(macd.macd[149].abs() < 1e-9);
    }
}
