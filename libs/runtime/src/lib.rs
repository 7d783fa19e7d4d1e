//! Process-level plumbing shared by the users binaries: layered configuration
//! and tracing initialisation.

pub mod config;
pub mod logging;

pub use config::{
    default_logging_config, AppConfig, CliOverrides, DatabaseConfig, LoggingConfig, Section,
};
pub use logging::init_logging_from_config;
