// Market data domain
pub mod market;

// Signal outputs and tuning parameters
pub mod signals;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
