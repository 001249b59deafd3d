//! Tracing setup for the concertdb CLI
//!
//! Usage:
//!   concertdb --debug ...               # Debug logging to stderr
//!   RUST_LOG=concertdb=trace concertdb  # Fine-grained log control

use crate::utils::error::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Use the debug level unless RUST_LOG is set explicitly
    pub debug: bool,
}

pub fn init_logging(config: &LoggingConfig) -> AppResult<()> {
    let default_level = if config.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| AppError::System(format!("Failed to initialize logging: {}", e)))
}
