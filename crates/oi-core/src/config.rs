use url::Url;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let raw_endpoint = require("OI_GRAPHQL_ENDPOINT")?;
    let graphql_endpoint = Url::parse(raw_endpoint.trim())
        .map_err(|e| invalid("OI_GRAPHQL_ENDPOINT", e.to_string()))?;
    if !matches!(graphql_endpoint.scheme(), "http" | "https") {
        return Err(invalid(
            "OI_GRAPHQL_ENDPOINT",
            format!("unsupported scheme \"{}\"", graphql_endpoint.scheme()),
        ));
    }

    let env = parse_environment(&or_default("OI_ENV", "development"))?;
    let log_level = or_default("OI_LOG_LEVEL", "info");
    let user_agent = or_default("OI_USER_AGENT", "oi/0.1 (article-catalog)");

    let request_timeout_secs = parse_u64("OI_REQUEST_TIMEOUT_SECS", "30")?;
    let query_max_retries = parse_u32("OI_QUERY_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("OI_RETRY_BACKOFF_BASE_MS", "500")?;

    let operation_timeout_secs = match lookup("OI_OPERATION_TIMEOUT_SECS") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("OI_OPERATION_TIMEOUT_SECS", e.to_string()))?,
        ),
        Err(_) => None,
    };

    let page_size = or_default("OI_PAGE_SIZE", "20")
        .parse::<usize>()
        .map_err(|e| invalid("OI_PAGE_SIZE", e.to_string()))?;
    if page_size == 0 {
        return Err(invalid("OI_PAGE_SIZE", "must be greater than zero".into()));
    }

    Ok(AppConfig {
        graphql_endpoint,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        query_max_retries,
        retry_backoff_base_ms,
        operation_timeout_secs,
        page_size,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "OI_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
