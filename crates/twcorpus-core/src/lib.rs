//! Shared configuration and file plumbing for the twcorpus tools.

pub mod config;
pub mod fetch_config;
pub mod io;

use thiserror::Error;

pub use config::{load_fetch_config, load_fetch_config_from_env, load_log_level};
pub use fetch_config::FetchConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
