use crate::application::signal_engine::SignalAggregator;
use crate::domain::errors::SignalError;
use crate::domain::market::Series;
use crate::domain::signals::Analysis;
use rayon::prelude::*;

/// Result of analysing one series in a batch
#[derive(Debug, Clone)]
pub struct BatchAnalysisResult {
    pub symbol: String,
    pub result: Result<Analysis, SignalError>,
}

/// Analyses several series concurrently on the Rayon pool.
///
/// Each series is analysed independently by the shared aggregator; failures
/// are captured per symbol. Results keep the input order.
pub fn analyze_batch(aggregator: &SignalAggregator, series: &[Series]) -> Vec<BatchAnalysisResult> {
    series
        .par_iter()
        .map(|s| BatchAnalysisResult {
            symbol: s.symbol().to_string(),
            result: aggregator.analyze(s),
        })
        .collect()
}
