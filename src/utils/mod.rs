//! Utility modules for configuration and logging

pub mod config;
pub mod logging;

pub use config::{ConfigError, PipelineConfig};
pub use logging::init_logger;
