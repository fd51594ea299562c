use crate::config::types::{
    ApiConfig, CollectorConfig, Config, OutputConfig, RetryConfig, StoreBackend, RANKED_TIERS,
};
use crate::ConfigError;
use url::Url;

const DIVISIONS: [&str; 4] = ["I", "II", "III", "IV"];

/// Upper bound for `lookback-days` (ten years)
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_collector_config(&config.collector)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_base_url("platform_url", &config.platform_url)?;
    validate_base_url("regional_url", &config.regional_url)?;

    if config.queue.is_empty() {
        return Err(ConfigError::Validation("queue cannot be empty".to_string()));
    }

    if !RANKED_TIERS.contains(&config.tier.as_str()) {
        return Err(ConfigError::Validation(format!(
            "tier must be one of {}, got '{}'",
            RANKED_TIERS.join(", "),
            config.tier
        )));
    }

    if !DIVISIONS.contains(&config.division.as_str()) {
        return Err(ConfigError::Validation(format!(
            "division must be one of I, II, III, IV, got '{}'",
            config.division
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Base URLs must be absolute http(s) URLs that can carry a path
fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' cannot be used as a base URL",
            field, value
        )));
    }

    Ok(())
}

fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.lookback_days < 1 {
        return Err(ConfigError::Validation(format!(
            "lookback_days must be >= 1, got {}",
            config.lookback_days
        )));
    }

    if config.lookback_days > MAX_LOOKBACK_DAYS {
        return Err(ConfigError::Validation(format!(
            "lookback_days must be <= {}, got {}",
            MAX_LOOKBACK_DAYS, config.lookback_days
        )));
    }
    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.min_backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "min_backoff_ms ({}) cannot exceed max_backoff_ms ({})",
            config.min_backoff_ms, config.max_backoff_ms
        )));
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    match config.backend {
        StoreBackend::Files if config.directory.is_empty() => Err(ConfigError::Validation(
            "directory cannot be empty".to_string(),
        )),
        StoreBackend::Sqlite if config.database_path.is_empty() => Err(
            ConfigError::Validation("database_path cannot be empty".to_string()),
        ),
        _ => Ok(()),
    }
}
