use crate::fetch_config::FetchConfig;
use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com/";
pub const DEFAULT_USER_AGENT: &str = "twcorpus/0.1 (corpus-builder)";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Load download configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if `BEARER_TOKEN` is missing or a value is invalid.
pub fn load_fetch_config() -> Result<FetchConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_fetch_config_from_env()
}

/// Load download configuration from environment variables already in the process.
///
/// Unlike [`load_fetch_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if `BEARER_TOKEN` is missing or a value is invalid.
pub fn load_fetch_config_from_env() -> Result<FetchConfig, ConfigError> {
    build_fetch_config(|key| std::env::var(key))
}

/// Log filter directive from `TWCORPUS_LOG_LEVEL`, defaulting to `info`.
#[must_use]
pub fn load_log_level() -> String {
    log_level_from(|key| std::env::var(key))
}

fn log_level_from<F>(lookup: F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("TWCORPUS_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
}

/// Build download configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap`.
fn build_fetch_config<F>(lookup: F) -> Result<FetchConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let bearer_token = require("BEARER_TOKEN")?;
    let api_base_url = or_default("TWCORPUS_API_BASE_URL", DEFAULT_API_BASE_URL);
    let user_agent = or_default("TWCORPUS_USER_AGENT", DEFAULT_USER_AGENT);

    let request_timeout_secs = match lookup("TWCORPUS_REQUEST_TIMEOUT_SECS") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: "TWCORPUS_REQUEST_TIMEOUT_SECS".to_string(),
                    reason: e.to_string(),
                })?,
        ),
        Err(_) => None,
    };

    let long_wait_secs = parse_u64("TWCORPUS_LONG_WAIT_SECS", "60")?;
    let default_wait_secs = parse_u64("TWCORPUS_DEFAULT_WAIT_SECS", "2")?;
    let max_attempts = parse_u32("TWCORPUS_MAX_ATTEMPTS", "10")?;
    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TWCORPUS_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(FetchConfig {
        bearer_token,
        api_base_url,
        user_agent,
        request_timeout_secs,
        long_wait_secs,
        default_wait_secs,
        max_attempts,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
