// Signal engine outputs and tuning parameters
pub mod config;
pub mod types;

pub use config::{MacdParams, MacdSearchSpace, SignalConfig};
pub use types::{
    Analysis, IndicatorFrame, Recommendation, RiskLevels, SignalFlags, SignalSnapshot,
};
