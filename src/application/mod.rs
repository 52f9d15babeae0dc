// Indicator primitives and their backends
pub mod indicators;

// Wavelet-denoised MACD and its calibration
pub mod macd;

// Dynamic support/resistance grid
pub mod grid;

// Confluence scoring and risk levels
pub mod signal_engine;

// Parallel analysis of many series
pub mod batch;

pub use signal_engine::{SignalAggregator, evaluate_bar};
