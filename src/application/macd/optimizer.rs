use crate::domain::errors::SignalError;
use crate::domain::ports::IndicatorBackend;
use crate::domain::signals::{MacdParams, MacdSearchSpace};
use statrs::statistics::Statistics;
use tracing::{debug, info, warn};

/// Outcome of the MACD period calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdCalibration {
    pub params: MacdParams,
    /// Best signal-to-noise score, `None` when the fallback was used
    pub fitness: Option<f64>,
    pub candidates_evaluated: usize,
}

impl MacdCalibration {
    fn fallback(space: &MacdSearchSpace, evaluated: usize) -> Self {
        Self {
            params: space.fallback,
            fitness: None,
            candidates_evaluated: evaluated,
        }
    }
}

/// Raw (undenoised) MACD line of one candidate over its defined span
fn candidate_macd(
    backend: &dyn IndicatorBackend,
    close: &[f64],
    params: MacdParams,
) -> Result<Vec<f64>, SignalError> {
    let fast = backend.ema(close, params.fast)?;
    let slow = backend.ema(close, params.slow)?;
    let dif: Vec<f64> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| f - s)
        .filter(|d| d.is_finite())
        .collect();
    let dea = backend.ema(&dif, params.signal)?;

    Ok(dif
        .iter()
        .zip(&dea)
        .map(|(d, e)| d - e)
        .filter(|m| m.is_finite())
        .collect())
}

/// Signal-to-noise ratio `mean(|macd|) / stddev(macd)`, `None` when undefined.
pub fn macd_fitness(macd: &[f64]) -> Option<f64> {
    if macd.is_empty() {
        return None;
    }
    let std = macd.iter().population_std_dev();
    if !std.is_finite() || std == 0.0 {
        return None;
    }
    let fitness = macd.iter().map(|m| m.abs()).mean() / std;
    fitness.is_finite().then_some(fitness)
}

/// Brute-force search for the MACD periods with the highest fitness.
///
/// Candidates are scored in enumeration order and only a strictly better score
/// replaces the incumbent, so ties keep the earliest candidate. Short input or
/// a search without any scorable candidate yields the fallback periods.
pub fn optimize_macd_params(
    backend: &dyn IndicatorBackend,
    close: &[f64],
    space: &MacdSearchSpace,
) -> MacdCalibration {
    if close.len() < space.min_points {
        warn!(
            "Insufficient data for MACD optimization ({} < {}), using {}",
            close.len(),
            space.min_points,
            space.fallback
        );
        return MacdCalibration::fallback(space, 0);
    }

    let mut best: Option<(MacdParams, f64)> = None;
    let mut evaluated = 0usize;

    for params in space.candidates() {
        evaluated += 1;
        let macd = match candidate_macd(backend, close, params) {
            Ok(macd) => macd,
            Err(e) => {
                debug!("Skipping MACD candidate {}: {}", params, e);
                continue;
            }
        };
        let Some(fitness) = macd_fitness(&macd) else {
            continue;
        };
        if best.is_none_or(|(_, best_fitness)| fitness > best_fitness) {
            best = Some((params, fitness));
        }
    }

    match best {
        Some((params, fitness)) => {
            info!(
                "Optimized MACD params: {} (fitness: {:.2}, candidates: {})",
                params, fitness, evaluated
            );
            MacdCalibration {
                params,
                fitness: Some(fitness),
                candidates_evaluated: evaluated,
            }
        }
        None => {
            warn!(
                "MACD optimization found no viable candidate among {}, using {}",
                evaluated, space.fallback
            );
            MacdCalibration::fallback(space, evaluated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::indicators::{StreamingBackend, VectorBackend};

    fn oscillating_close(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                100.0 + 8.0 * (t / 9.0).sin() + 3.0 * (t / 2.3).cos() + 0.02 * t
            })
            .collect()
    }

    #[test]
    fn test_short_input_uses_fallback() {
        let close = oscillating_close(99);
        let result = optimize_macd_params(&StreamingBackend, &close, &MacdSearchSpace::default());
        assert_eq!(result.params, MacdParams::new(12, 26, 9));
        assert_eq!(result.fitness, None);
        assert_eq!(result.candidates_evaluated, 0);
    }

    #[test]
    fn test_constant_prices_use_fallback() {
        // DIF is identically zero, so every candidate has zero stddev
        let close = vec![42.0; 150];
        let result = optimize_macd_params(&StreamingBackend, &close, &MacdSearchSpace::default());
        assert_eq!(result.params, MacdParams::default());
        assert_eq!(result.fitness, None);
        assert_eq!(result.candidates_evaluated, 80);
    }

    #[test]
    fn test_search_is_deterministic() {
        let close = oscillating_close(300);
        let space = MacdSearchSpace::default();
        let first = optimize_macd_params(&StreamingBackend, &close, &space);
        let second = optimize_macd_params(&StreamingBackend, &close, &space);
        assert_eq!(first, second);
        assert!(first.fitness.is_some());
        assert!(space.candidates().any(|p| p == first.params));
    }

    #[test]
    fn test_selected_candidate_beats_every_other() {
        let close = oscillating_close(250);
        let space = MacdSearchSpace::default();
        let result = optimize_macd_params(&VectorBackend, &close, &space);
        let best = result.fitness.unwrap();

        for params in space.candidates() {
            let macd = candidate_macd(&VectorBackend, &close, params).unwrap();
            if let Some(fitness) = macd_fitness(&macd) {
                assert!(fitness <= best, "{} scored {} > {}", params, fitness, best);
            }
        }
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        // Duplicate candidates score identically; the first one must win
        let space = MacdSearchSpace {
            fast: vec![10, 10],
            slow: vec![26],
            signal: vec![9],
            ..Default::default()
        };
        let close = oscillating_close(200);
        let result = optimize_macd_params(&StreamingBackend, &close, &space);
        assert_eq!(result.params, MacdParams::new(10, 26, 9));
        assert_eq!(result.candidates_evaluated, 2);
    }

    #[test]
    fn test_fitness_of_flat_line_is_undefined() {
        assert_eq!(macd_fitness(&[]), None);
        assert_eq!(macd_fitness(&[1.0, 1.0, 1.0]), None);
        let f = macd_fitness(&[1.0, -1.0, 1.0, -1.0]).unwrap();
        assert!((f - 1.0).abs() < 1e-12);
    }
}
