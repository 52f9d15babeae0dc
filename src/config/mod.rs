//! Configuration module.
//!
//! Loads the signal engine parameters and the indicator backend choice from
//! environment variables. Callers are expected to load `.env` first.

mod signal_config;

pub use signal_config::SignalEnvConfig;

use crate::application::indicators::BackendKind;
use crate::application::signal_engine::SignalAggregator;
use crate::domain::signals::SignalConfig;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub signal: SignalConfig,
    pub backend: BackendKind,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let signal = SignalEnvConfig::from_env()?.signal;
        let backend = match env::var("INDICATOR_BACKEND") {
            Ok(value) => BackendKind::from_str(&value)?,
            Err(_) => BackendKind::default(),
        };

        Ok(Self { signal, backend })
    }

    pub fn build_aggregator(&self) -> Result<SignalAggregator> {
        let aggregator = SignalAggregator::new(self.signal.clone())
            .context("Failed to build signal aggregator")?;
        Ok(aggregator.with_backend(self.backend.build()))
    }
}
