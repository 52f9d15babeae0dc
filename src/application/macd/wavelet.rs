//! Multi-level discrete wavelet transform and universal-threshold denoising.
//!
//! Decomposition convolves with the analysis filters over a half-sample
//! symmetric extension of the signal and keeps every second output, so a band
//! of length `n` yields `(n + L - 1) / 2` coefficients for a filter of length
//! `L`. Reconstruction upsamples and keeps the valid part of the synthesis
//! convolution, which restores the signal exactly up to rounding.

use crate::domain::errors::WaveletError;
use statrs::statistics::{Data, Median};

/// Below this many samples denoising is a no-op
pub const MIN_DENOISE_LEN: usize = 10;

/// Normalisation of the median absolute deviation to a Gaussian sigma
const MAD_TO_SIGMA: f64 = 0.6745;

/// Daubechies-4 scaling (low-pass decomposition) filter
const DB4_DEC_LO: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888114,
    -0.02798376941698385,
    0.6308807679295904,
    0.7148465705525415,
    0.23037781330885523,
];

/// Orthogonal wavelet filter bank
#[derive(Debug, Clone, PartialEq)]
pub struct Wavelet {
    dec_lo: Vec<f64>,
    dec_hi: Vec<f64>,
    rec_lo: Vec<f64>,
    rec_hi: Vec<f64>,
}

impl Wavelet {
    /// Builds the quadrature-mirror bank from a scaling filter of even length.
    pub fn from_scaling_filter(dec_lo: &[f64]) -> Self {
        let len = dec_lo.len();
        let dec_hi: Vec<f64> = (0..len)
            .map(|k| {
                let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
                sign * dec_lo[len - 1 - k]
            })
            .collect();
        let rec_lo = dec_lo.iter().rev().copied().collect();
        let rec_hi = dec_hi.iter().rev().copied().collect();

        Self {
            dec_lo: dec_lo.to_vec(),
            dec_hi,
            rec_lo,
            rec_hi,
        }
    }

    pub fn db4() -> Self {
        Self::from_scaling_filter(&DB4_DEC_LO)
    }

    pub fn filter_len(&self) -> usize {
        self.dec_lo.len()
    }

    /// One analysis step: `(approximation, detail)`.
    pub fn dwt(&self, signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (
            downsample_convolve(signal, &self.dec_lo),
            downsample_convolve(signal, &self.dec_hi),
        )
    }

    /// One synthesis step. `approx` may carry one extra trailing coefficient,
    /// which is dropped.
    pub fn idwt(&self, approx: &[f64], detail: &[f64]) -> Result<Vec<f64>, WaveletError> {
        let approx = match approx.len() {
            n if n == detail.len() => approx,
            n if n == detail.len() + 1 => &approx[..detail.len()],
            n => {
                return Err(WaveletError::BandMismatch {
                    approx: n,
                    detail: detail.len(),
                });
            }
        };
        if detail.len() < self.filter_len() / 2 {
            return Err(WaveletError::TooShort {
                len: detail.len(),
                min: self.filter_len() / 2,
            });
        }

        let mut out = upsample_convolve(approx, &self.rec_lo);
        for (o, d) in out.iter_mut().zip(upsample_convolve(detail, &self.rec_hi)) {
            *o += d;
        }
        Ok(out)
    }
}

/// Maps an out-of-range index onto `0..len` by mirroring at both edges
/// (`x[-1] = x[0]`, `x[len] = x[len - 1]`).
fn symmetric_index(i: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let i = i.rem_euclid(period);
    if i < len as isize {
        i as usize
    } else {
        (period - 1 - i) as usize
    }
}

fn downsample_convolve(signal: &[f64], filter: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let f = filter.len();
    (1..n + f - 1)
        .step_by(2)
        .map(|i| {
            filter
                .iter()
                .enumerate()
                .map(|(j, h)| h * signal[symmetric_index(i as isize - j as isize, n)])
                .sum()
        })
        .collect()
}

fn upsample_convolve(coeffs: &[f64], filter: &[f64]) -> Vec<f64> {
    let half = filter.len() / 2;
    let mut out = Vec::with_capacity(2 * (coeffs.len() + 1 - half));
    for i in (half - 1)..coeffs.len() {
        let (mut even, mut odd) = (0.0, 0.0);
        for j in 0..half {
            even += filter[2 * j] * coeffs[i - j];
            odd += filter[2 * j + 1] * coeffs[i - j];
        }
        out.push(even);
        out.push(odd);
    }
    out
}

/// Coefficients of a multi-level decomposition
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub approximation: Vec<f64>,
    /// Detail bands ordered coarsest first; the last band is the finest
    pub details: Vec<Vec<f64>>,
}

impl Decomposition {
    pub fn finest_detail(&self) -> Option<&[f64]> {
        self.details.last().map(Vec::as_slice)
    }
}

pub fn wavedec(
    wavelet: &Wavelet,
    signal: &[f64],
    levels: usize,
) -> Result<Decomposition, WaveletError> {
    if signal.is_empty() {
        return Err(WaveletError::TooShort { len: 0, min: 1 });
    }
    if let Some(index) = signal.iter().position(|v| !v.is_finite()) {
        return Err(WaveletError::NonFinite { index });
    }

    let mut approximation = signal.to_vec();
    let mut details = Vec::with_capacity(levels);
    for _ in 0..levels {
        let (a, d) = wavelet.dwt(&approximation);
        details.push(d);
        approximation = a;
    }
    details.reverse();

    Ok(Decomposition {
        approximation,
        details,
    })
}

pub fn waverec(wavelet: &Wavelet, coeffs: &Decomposition) -> Result<Vec<f64>, WaveletError> {
    let mut approx = coeffs.approximation.clone();
    for detail in &coeffs.details {
        approx = wavelet.idwt(&approx, detail)?;
    }
    Ok(approx)
}

pub fn soft_threshold(value: f64, threshold: f64) -> f64 {
    let shrunk = value.abs() - threshold;
    if shrunk > 0.0 {
        value.signum() * shrunk
    } else {
        0.0
    }
}

/// Universal threshold `sigma * sqrt(2 ln n)` with a MAD estimate of sigma.
pub fn universal_threshold(finest_detail: &[f64], signal_len: usize) -> f64 {
    if finest_detail.is_empty() || signal_len < 2 {
        return 0.0;
    }
    let abs: Vec<f64> = finest_detail.iter().map(|d| d.abs()).collect();
    let sigma = Data::new(abs).median() / MAD_TO_SIGMA;
    sigma * (2.0 * (signal_len as f64).ln()).sqrt()
}

fn try_denoise(signal: &[f64], levels: usize) -> Result<Vec<f64>, WaveletError> {
    let wavelet = Wavelet::db4();
    let mut coeffs = wavedec(&wavelet, signal, levels)?;

    let threshold = coeffs
        .finest_detail()
        .map(|d| universal_threshold(d, signal.len()))
        .unwrap_or(0.0);
    for band in &mut coeffs.details {
        for c in band.iter_mut() {
            *c = soft_threshold(*c, threshold);
        }
    }

    let mut denoised = waverec(&wavelet, &coeffs)?;
    if let Some(index) = denoised.iter().position(|v| !v.is_finite()) {
        return Err(WaveletError::NonFinite { index });
    }
    let pad = denoised.last().copied().unwrap_or(0.0);
    denoised.resize(signal.len(), pad);

    tracing::debug!(
        len = signal.len(),
        levels,
        threshold,
        "Wavelet denoising applied"
    );
    Ok(denoised)
}

/// Daubechies-4 soft-threshold denoising.
///
/// Returns a vector of the input's length. Signals shorter than
/// [`MIN_DENOISE_LEN`] are returned unchanged, and so is the input when
/// decomposition or reconstruction fails.
pub fn wavelet_denoise(signal: &[f64], levels: usize) -> Vec<f64> {
    if signal.len() < MIN_DENOISE_LEN {
        return signal.to_vec();
    }

    match try_denoise(signal, levels) {
        Ok(denoised) => denoised,
        Err(e) => {
            tracing::warn!("Wavelet denoising failed: {}. Using raw signal.", e);
            signal.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_with_noise(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                0.05 * t + (t * 0.4).sin() + 0.3 * (t * 2.9).cos()
            })
            .collect()
    }

    #[test]
    fn test_filter_bank_is_orthonormal() {
        let w = Wavelet::db4();
        let energy: f64 = w.dec_lo.iter().map(|h| h * h).sum();
        assert!((energy - 1.0).abs() < 1e-10);
        let sum_lo: f64 = w.dec_lo.iter().sum();
        assert!((sum_lo - std::f64::consts::SQRT_2).abs() < 1e-10);
        let sum_hi: f64 = w.dec_hi.iter().sum();
        assert!(sum_hi.abs() < 1e-10);
    }

    #[test]
    fn test_band_lengths() {
        let coeffs = wavedec(&Wavelet::db4(), &ramp_with_noise(100), 3).unwrap();
        let lens: Vec<usize> = coeffs.details.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![18, 30, 53]);
        assert_eq!(coeffs.approximation.len(), 18);
    }

    #[test]
    fn test_perfect_reconstruction() {
        let w = Wavelet::db4();
        for n in [10, 11, 57, 100, 201] {
            let signal = ramp_with_noise(n);
            let coeffs = wavedec(&w, &signal, 3).unwrap();
            let rebuilt = waverec(&w, &coeffs).unwrap();
            assert!(rebuilt.len() >= n);
            for (a, b) in signal.iter().zip(&rebuilt) {
                assert!((a - b).abs() < 1e-8, "n={n}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_constant_signal_unchanged() {
        let signal = vec![3.25; 120];
        let denoised = wavelet_denoise(&signal, 3);
        assert_eq!(denoised.len(), 120);
        for v in denoised {
            assert!((v - 3.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_signal_passthrough() {
        let signal = vec![1.0, 5.0, -2.0, 8.0, 0.5, 3.0, 2.0, 9.0, 4.0];
        assert_eq!(wavelet_denoise(&signal, 3), signal);
    }

    #[test]
    fn test_non_finite_input_falls_back() {
        let mut signal = ramp_with_noise(50);
        signal[7] = f64::NAN;
        let out = wavelet_denoise(&signal, 3);
        assert_eq!(out.len(), 50);
        assert!(out[7].is_nan());
        assert_eq!(out[8], signal[8]);
    }

    #[test]
    fn test_denoising_is_positively_homogeneous() {
        let signal = ramp_with_noise(150);
        let scaled: Vec<f64> = signal.iter().map(|v| v * 4.0).collect();
        let a = wavelet_denoise(&signal, 3);
        let b = wavelet_denoise(&scaled, 3);
        for (x, y) in a.iter().zip(&b) {
            assert!((x * 4.0 - y).abs() < 1e-8);
        }
    }

    #[test]
    fn test_denoising_reduces_roughness() {
        let signal = ramp_with_noise(200);
        let denoised = wavelet_denoise(&signal, 3);
        let roughness = |s: &[f64]| -> f64 { s.windows(2).map(|w| (w[1] - w[0]).abs()).sum() };
        assert!(roughness(&denoised) < roughness(&signal));
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-0.5, 0.0), -0.5);
    }

    #[test]
    fn test_idwt_rejects_mismatched_bands() {
        let w = Wavelet::db4();
        let err = w.idwt(&[0.0; 10], &[0.0; 7]).unwrap_err();
        assert_eq!(err, WaveletError::BandMismatch { approx: 10, detail: 7 });
    }
}
