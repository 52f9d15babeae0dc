use crate::domain::errors::SignalError;
use ta::Next;
use ta::indicators::{Maximum, Minimum};

/// Support/resistance bands around the midpoint of recent price extremes
#[derive(Debug, Clone, PartialEq)]
pub struct GridLevels {
    pub window: usize,
    pub center: Vec<f64>,
    pub low: Vec<f64>,
    pub up: Vec<f64>,
}

/// `(grid_buy, grid_sell)` for a close against its bands. Undefined bands
/// never signal.
pub fn grid_signal(close: f64, low: f64, up: f64) -> (bool, bool) {
    (close <= low, close >= up)
}

/// Dynamic grid: the center is the midpoint of the rolling highest high and
/// lowest low over `min(max_window, len)` bars, the bands sit one ATR away.
pub fn compute_grid(
    high: &[f64],
    low: &[f64],
    atr: &[f64],
    max_window: usize,
) -> Result<GridLevels, SignalError> {
    let window = max_window.min(high.len()).max(1);
    let mut highest = Maximum::new(window).map_err(|e| SignalError::indicator("GRID", e))?;
    let mut lowest = Minimum::new(window).map_err(|e| SignalError::indicator("GRID", e))?;

    let len = high.len();
    let mut center = vec![f64::NAN; len];
    let mut grid_low = vec![f64::NAN; len];
    let mut grid_up = vec![f64::NAN; len];

    for i in 0..len {
        let hh = highest.next(high[i]);
        let ll = lowest.next(low[i]);
        if i + 1 < window {
            continue;
        }
        let mid = (hh + ll) / 2.0;
        center[i] = mid;
        // NaN ATR keeps the bands undefined
        grid_low[i] = mid - atr[i];
        grid_up[i] = mid + atr[i];
    }

    Ok(GridLevels {
        window,
        center,
        low: grid_low,
        up: grid_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_center_tracks_extremes() {
        let high: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let low: Vec<f64> = (0..10).map(|i| 5.0 + i as f64).collect();
        let atr = vec![1.0; 10];
        let grid = compute_grid(&high, &low, &atr, 4).unwrap();

        assert_eq!(grid.window, 4);
        assert!(grid.center[2].is_nan());
        // bars 0..=3: highest 13, lowest 5
        assert_eq!(grid.center[3], 9.0);
        assert_eq!(grid.low[3], 8.0);
        assert_eq!(grid.up[3], 10.0);
        // bars 6..=9: highest 19, lowest 11
        assert_eq!(grid.center[9], 15.0);
    }

    #[test]
    fn test_window_clamped_to_series_length() {
        let high = vec![12.0, 11.0, 14.0];
        let low = vec![8.0, 9.0, 10.0];
        let atr = vec![f64::NAN, f64::NAN, 2.0];
        let grid = compute_grid(&high, &low, &atr, 60).unwrap();
        assert_eq!(grid.window, 3);
        assert_eq!(grid.center[2], 11.0);
        assert_eq!(grid.low[2], 9.0);
        assert_eq!(grid.up[2], 13.0);
    }

    #[test]
    fn test_grid_signals() {
        assert_eq!(grid_signal(98.0, 98.0, 102.0), (true, false));
        assert_eq!(grid_signal(100.0, 98.0, 102.0), (false, false));
        assert_eq!(grid_signal(102.5, 98.0, 102.0), (false, true));
    }

    #[test]
    fn test_undefined_atr_never_signals() {
        let high = vec![2.0; 5];
        let low = vec![1.0; 5];
        let grid = compute_grid(&high, &low, &[f64::NAN; 5], 3).unwrap();
        assert_eq!(grid_signal(1.5, grid.low[4], grid.up[4]), (false, false));
    }
}
